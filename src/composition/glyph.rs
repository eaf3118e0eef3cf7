//! Glyph timeline data model
//!
//! A glyph is one user-placed light event. The field names on the wire
//! (`start`, `duration`) match the editor save format and the device bridge.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::effects::EffectKind;
use crate::error::{CassetteError, Result};
use crate::raster::label::format_label_line;

/// Effect attached to a glyph: the editor name plus its raw slot settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectDescriptor {
    pub name: String,
    #[serde(default)]
    pub settings: Map<String, Value>,
}

impl EffectDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            settings: Map::new(),
        }
    }

    /// Set one editor slot (`slider1`, `selector2`, ...).
    pub fn with_setting(mut self, slot: &str, value: impl Into<Value>) -> Self {
        self.settings.insert(slot.to_string(), value.into());
        self
    }

    /// Whether the effect animates the sub-zones of a segmented track.
    ///
    /// The editor records this as `settings.segmented`; descriptors written
    /// without it fall back to the effect kind.
    pub fn is_segmented(&self) -> bool {
        match self.settings.get("segmented").and_then(Value::as_bool) {
            Some(segmented) => segmented,
            None => EffectKind::from_name(&self.name)
                .map(|kind| kind.is_segmented())
                .unwrap_or(false),
        }
    }
}

/// A user-placed light event on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Glyph {
    /// Logical track, `"3"` or `"3.2"` for a sub-zone.
    pub track: String,
    #[serde(rename = "start")]
    pub start_ms: f64,
    #[serde(rename = "duration")]
    pub duration_ms: f64,
    /// Brightness in percent (0-100).
    pub brightness: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<EffectDescriptor>,
}

impl Glyph {
    pub fn new(track: impl Into<String>, start_ms: f64, duration_ms: f64, brightness: u8) -> Self {
        Self {
            track: track.into(),
            start_ms,
            duration_ms,
            brightness,
            effect: None,
        }
    }

    pub fn with_effect(mut self, effect: EffectDescriptor) -> Self {
        self.effect = Some(effect);
        self
    }

    pub fn end_ms(&self) -> f64 {
        self.start_ms + self.duration_ms
    }

    pub fn is_zone_track(&self) -> bool {
        self.track.contains('.')
    }

    /// Label line for a glyph without an effect.
    pub fn to_label_line(&self) -> String {
        format_label_line(
            self.start_ms / 1000.0,
            self.end_ms() / 1000.0,
            &format!("{}-{}-LIN", self.track, self.brightness),
        )
    }

    /// Check the fields the editor is supposed to guarantee.
    pub fn validate(&self) -> Result<()> {
        if parse_track(&self.track).is_none() {
            return Err(CassetteError::InvalidGlyph {
                reason: format!("malformed track '{}'", self.track),
            });
        }
        if self.brightness > 100 {
            return Err(CassetteError::InvalidGlyph {
                reason: format!("brightness {} is above 100", self.brightness),
            });
        }
        if !(self.start_ms.is_finite() && self.duration_ms.is_finite()) || self.duration_ms < 0.0 {
            return Err(CassetteError::InvalidGlyph {
                reason: format!(
                    "invalid time span {}ms + {}ms on track '{}'",
                    self.start_ms, self.duration_ms, self.track
                ),
            });
        }
        Ok(())
    }
}

/// Split a track into its glyph number and optional zone.
pub fn parse_track(track: &str) -> Option<(u32, Option<u32>)> {
    match track.split_once('.') {
        Some((glyph, zone)) => Some((glyph.parse().ok()?, Some(zone.parse().ok()?))),
        None => Some((track.parse().ok()?, None)),
    }
}
