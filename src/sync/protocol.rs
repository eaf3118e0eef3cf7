//! Wire frames and snapshot diffs
//!
//! Frames travel as one JSON object per line. The device answers a `ping`
//! with the bare line `pong`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::composition::Glyph;
use crate::effects::Segment;
use crate::error::Result;

/// Reply expected to a [`Frame::Ping`].
pub const PONG: &str = "pong";

/// A glyph as sent to the device, with its effect already expanded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireGlyph {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub glyph: Glyph,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect_to_glyphs: Option<Vec<Segment>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Frame {
    Ping,
    Update { glyphs: BTreeMap<String, WireGlyph> },
    Delete { ids: Vec<String> },
    Play { from_ms: u64 },
    Stop,
    Load { glyphs: Vec<WireGlyph> },
}

impl Frame {
    pub fn action(&self) -> &'static str {
        match self {
            Frame::Ping => "ping",
            Frame::Update { .. } => "update",
            Frame::Delete { .. } => "delete",
            Frame::Play { .. } => "play",
            Frame::Stop => "stop",
            Frame::Load { .. } => "load",
        }
    }

    /// Serialized frame with its trailing newline.
    pub fn to_line(&self) -> Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    pub fn from_line(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line.trim())?)
    }
}

/// Difference between the last synchronized snapshot and the current glyphs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncDiff {
    /// Ids present before and gone now, in id order.
    pub deleted: Vec<String>,
    /// New glyphs and glyphs whose tracked fields changed.
    pub changed: BTreeMap<String, Glyph>,
}

impl SyncDiff {
    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty() && self.changed.is_empty()
    }
}

/// Whether the device-visible fields of a glyph differ.
pub fn glyph_changed(before: &Glyph, after: &Glyph) -> bool {
    before.track != after.track
        || before.start_ms != after.start_ms
        || before.duration_ms != after.duration_ms
        || before.brightness != after.brightness
        || before.effect != after.effect
}

pub fn diff(before: &BTreeMap<String, Glyph>, after: &BTreeMap<String, Glyph>) -> SyncDiff {
    let deleted = before
        .keys()
        .filter(|id| !after.contains_key(*id))
        .cloned()
        .collect();

    let changed = after
        .iter()
        .filter(|(id, glyph)| match before.get(*id) {
            Some(previous) => glyph_changed(previous, glyph),
            None => true,
        })
        .map(|(id, glyph)| (id.clone(), glyph.clone()))
        .collect();

    SyncDiff { deleted, changed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::EffectDescriptor;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn glyphs(entries: &[(&str, Glyph)]) -> BTreeMap<String, Glyph> {
        entries
            .iter()
            .map(|(id, glyph)| (id.to_string(), glyph.clone()))
            .collect()
    }

    #[test]
    fn test_diff_reports_deleted_and_changed() {
        let a = Glyph::new("1", 0.0, 100.0, 100);
        let b = Glyph::new("2", 0.0, 100.0, 100);
        let before = glyphs(&[("1", a.clone()), ("2", b.clone()), ("3", a.clone())]);
        let moved = Glyph { start_ms: 50.0, ..b.clone() };
        let after = glyphs(&[("1", a.clone()), ("2", moved.clone()), ("4", a.clone())]);

        let diff = diff(&before, &after);
        assert_eq!(diff.deleted, vec!["3".to_string()]);
        assert_eq!(diff.changed, glyphs(&[("2", moved), ("4", a)]));
    }

    #[test]
    fn test_unchanged_snapshot_is_empty() {
        let before = glyphs(&[("1", Glyph::new("1", 0.0, 100.0, 100))]);
        assert!(diff(&before, &before.clone()).is_empty());
    }

    #[test]
    fn test_effect_change_is_detected() {
        let plain = Glyph::new("1", 0.0, 100.0, 100);
        let with_effect = plain.clone().with_effect(EffectDescriptor::new("Strobe"));
        assert!(glyph_changed(&plain, &with_effect));
    }

    #[test]
    fn test_frame_json() {
        let frame = Frame::Play { from_ms: 1500 };
        assert_eq!(frame.to_line().unwrap(), "{\"action\":\"play\",\"from_ms\":1500}\n");
        assert_eq!(Frame::Stop.to_line().unwrap(), "{\"action\":\"stop\"}\n");
        assert_eq!(Frame::Ping.to_line().unwrap(), "{\"action\":\"ping\"}\n");
    }

    #[test]
    fn test_load_frame_carries_ids() {
        let frame = Frame::Load {
            glyphs: vec![WireGlyph {
                id: Some("7".to_string()),
                glyph: Glyph::new("2", 10.0, 20.0, 30),
                effect_to_glyphs: None,
            }],
        };
        let value: Value = serde_json::from_str(&frame.to_line().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "action": "load",
                "glyphs": [{"id": "7", "track": "2", "start": 10.0, "duration": 20.0, "brightness": 30}]
            })
        );
        assert_eq!(Frame::from_line(&frame.to_line().unwrap()).unwrap(), frame);
    }
}
