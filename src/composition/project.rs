//! Composition save files
//!
//! The editor stores a composition as JSON:
//! `{"audio": {"duration": s, "bpm": n, ...}, "model": "Phone (2a)", "glyphs": {"<id>": glyph}}`.
//! Fields this crate does not interpret are carried through a load/save cycle.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::glyph::Glyph;
use crate::effects::effect_to_label_lines;
use crate::error::{CassetteError, Result};
use crate::raster::label::label_document;
use crate::topology::PhoneModel;

/// Tempo used when the save file has no usable BPM.
pub const DEFAULT_BPM: f64 = 120.0;

/// Audio section of a save file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioInfo {
    /// Length of the cropped audio in seconds.
    #[serde(default)]
    pub duration: f64,
    /// Number or numeric string, kept as written.
    #[serde(default)]
    pub bpm: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AudioInfo {
    pub fn new(duration_s: f64, bpm: f64) -> Self {
        Self {
            duration: duration_s,
            bpm: Value::from(bpm),
            extra: Map::new(),
        }
    }
}

mod display_name {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::topology::PhoneModel;

    pub fn serialize<S: Serializer>(model: &PhoneModel, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(model.display_name())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PhoneModel, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// A composition as saved by the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    pub audio: AudioInfo,
    #[serde(with = "display_name")]
    pub model: PhoneModel,
    #[serde(default)]
    pub glyphs: BTreeMap<String, Glyph>,
    #[serde(flatten)]
    pub unknown_fields: Map<String, Value>,
}

/// Numeric ids first in numeric order, anything else after them.
pub(crate) fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

impl Composition {
    pub fn new(model: PhoneModel, audio: AudioInfo) -> Self {
        Self {
            audio,
            model,
            glyphs: BTreeMap::new(),
            unknown_fields: Map::new(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CassetteError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path)?;
        let composition: Self = serde_json::from_str(&content)?;
        for (id, glyph) in &composition.glyphs {
            glyph.validate().map_err(|e| CassetteError::InvalidGlyph {
                reason: format!("glyph {}: {}", id, e),
            })?;
        }
        debug!(
            "Loaded {} glyphs for {} from {}",
            composition.glyphs.len(),
            composition.model,
            path.display()
        );
        Ok(composition)
    }

    /// Write with 4-space indentation.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.serialize(&mut serializer)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, buffer)?;
        Ok(())
    }

    /// Tempo in beats per minute, [`DEFAULT_BPM`] when missing or unreadable.
    pub fn bpm(&self) -> f64 {
        let bpm = match &self.audio.bpm {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match bpm {
            Some(bpm) if bpm > 0.0 => bpm,
            _ => {
                warn!("Composition has no usable BPM, using {}", DEFAULT_BPM);
                DEFAULT_BPM
            }
        }
    }

    pub fn duration_s(&self) -> f64 {
        self.audio.duration
    }

    /// Glyphs in id order.
    pub fn ordered_glyphs(&self) -> Vec<(&str, &Glyph)> {
        let mut glyphs: Vec<(&str, &Glyph)> =
            self.glyphs.iter().map(|(id, g)| (id.as_str(), g)).collect();
        glyphs.sort_by(|a, b| compare_ids(a.0, b.0));
        glyphs
    }

    /// Split into plain glyphs and effect glyphs, both in id order.
    pub fn sorted_glyphs(&self) -> (Vec<&Glyph>, Vec<&Glyph>) {
        self.ordered_glyphs()
            .into_iter()
            .map(|(_, glyph)| glyph)
            .partition(|glyph| glyph.effect.is_none())
    }

    /// Label lines for every glyph: plain glyphs first, then expanded effects.
    pub fn to_label_lines<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<String>> {
        let (plain, effects) = self.sorted_glyphs();
        let bpm = self.bpm();

        let mut lines: Vec<String> = plain.iter().map(|glyph| glyph.to_label_line()).collect();
        for glyph in effects {
            lines.extend(effect_to_label_lines(glyph, self.model, bpm, None, rng)?);
        }
        Ok(lines)
    }

    /// Complete label file content for this composition.
    pub fn to_label_document<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<String> {
        let body = self.to_label_lines(rng)?;
        Ok(label_document(self.model, self.duration_s(), &body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::glyph::EffectDescriptor;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::tempdir;

    const SAVE: &str = r#"{
        "audio": {"duration": 2.5, "bpm": "128", "title": "Song", "beats": [0.5, 1.0]},
        "model": "Phone (2a)",
        "glyphs": {
            "10": {"track": "2", "start": 500, "duration": 100, "brightness": 80},
            "2": {"track": "1", "start": 0, "duration": 2000, "brightness": 100},
            "3": {"track": "3", "start": 0, "duration": 1000, "brightness": 100,
                  "effect": {"name": "Fade out", "settings": {}}}
        },
        "version": "1.4"
    }"#;

    #[test]
    fn test_load_and_order() {
        let composition: Composition = serde_json::from_str(SAVE).unwrap();
        assert_eq!(composition.model, PhoneModel::Phone2A);
        assert_eq!(composition.bpm(), 128.0);

        let ids: Vec<&str> = composition.ordered_glyphs().iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec!["2", "3", "10"]);

        let (plain, effects) = composition.sorted_glyphs();
        assert_eq!(plain.len(), 2);
        assert_eq!(effects.len(), 1);
    }

    #[test]
    fn test_label_lines_put_plain_glyphs_first() {
        let composition: Composition = serde_json::from_str(SAVE).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let lines = composition.to_label_lines(&mut rng).unwrap();
        assert_eq!(lines[0], "0.000000\t2.000000\t1-100-LIN");
        assert_eq!(lines[1], "0.500000\t0.600000\t2-80-LIN");
        assert!(lines[2].ends_with("3-100-0-LIN"));
    }

    #[test]
    fn test_label_document_frame() {
        let composition: Composition = serde_json::from_str(SAVE).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let document = composition.to_label_document(&mut rng).unwrap();
        let lines: Vec<&str> = document.lines().collect();
        assert_eq!(lines[0], "0.000000\t0.000000\tLABEL_VERSION=1");
        assert_eq!(lines[1], "0.000000\t0.000000\tPHONE_MODEL=PHONE2A");
        assert_eq!(lines.last().unwrap(), &"2.500000\t2.500000\tEND");
    }

    #[test]
    fn test_save_preserves_unknown_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Save.json");
        let mut composition: Composition = serde_json::from_str(SAVE).unwrap();
        composition.glyphs.insert(
            "11".to_string(),
            Glyph::new("1", 0.0, 100.0, 50).with_effect(EffectDescriptor::new("Strobe")),
        );
        composition.save(&path).unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["version"], "1.4");
        assert_eq!(raw["model"], "Phone (2a)");
        assert_eq!(raw["audio"]["title"], "Song");
        assert_eq!(raw["audio"]["bpm"], "128");

        let reloaded = Composition::load(&path).unwrap();
        assert_eq!(reloaded, composition);
    }

    #[test]
    fn test_missing_bpm_uses_default() {
        let composition = Composition::new(PhoneModel::Phone1, AudioInfo {
            duration: 1.0,
            bpm: Value::Null,
            extra: Map::new(),
        });
        assert_eq!(composition.bpm(), DEFAULT_BPM);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Composition::load(Path::new("/nonexistent/Save.json")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_NOT_FOUND");
    }
}
