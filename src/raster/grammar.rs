//! Label text grammars
//!
//! Light labels read `<glyph>[.<zone>]-<brightness>[-<brightness2>][-<MODE>]`.
//! Which glyphs and zones exist depends on the phone model, so the text is
//! matched lexically first and then checked against the model's topology.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::topology::PhoneModel;

lazy_static! {
    static ref LIGHT_LABEL: Regex = Regex::new(
        r"^([1-9]\d?)(?:\.([1-9]\d?))?-(\d{1,2}|100)(?:-(\d{1,2}|100))?(?:-(EXP|LIN|LOG))?$"
    )
    .unwrap();
    static ref VERSION_LABEL: Regex = Regex::new(r"^LABEL_VERSION=(\d+)$").unwrap();
    static ref PHONE_MODEL_LABEL: Regex = Regex::new(r"^PHONE_MODEL=(\w+)$").unwrap();
}

/// Brightness curve between the two levels of a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightMode {
    Lin,
    Exp,
    Log,
}

impl LightMode {
    fn from_token(token: &str) -> Self {
        match token {
            "EXP" => LightMode::Exp,
            "LOG" => LightMode::Log,
            _ => LightMode::Lin,
        }
    }
}

impl fmt::Display for LightMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LightMode::Lin => "LIN",
            LightMode::Exp => "EXP",
            LightMode::Log => "LOG",
        })
    }
}

/// Values of a light label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightLabel {
    pub glyph: u32,
    /// 0 addresses the whole glyph.
    pub zone: u32,
    pub level_from: u8,
    pub level_to: u8,
    pub mode: LightMode,
}

impl LightLabel {
    pub fn is_zone_label(&self) -> bool {
        self.zone != 0
    }
}

/// Match `text` against the grammar of `model`.
pub fn parse_light_label(text: &str, model: PhoneModel) -> Option<LightLabel> {
    let caps = LIGHT_LABEL.captures(text)?;

    let glyph: u32 = caps.get(1)?.as_str().parse().ok()?;
    if glyph > model.track_count() {
        return None;
    }

    let zone = match caps.get(2) {
        Some(zone) => {
            let zone: u32 = zone.as_str().parse().ok()?;
            match model.zones_of(glyph) {
                Some(zones) if zone <= zones => zone,
                _ => return None,
            }
        }
        None => 0,
    };

    let level_from: u8 = caps.get(3)?.as_str().parse().ok()?;
    let level_to = match caps.get(4) {
        Some(level) => level.as_str().parse().ok()?,
        None => level_from,
    };
    let mode = caps
        .get(5)
        .map_or(LightMode::Lin, |m| LightMode::from_token(m.as_str()));

    Some(LightLabel {
        glyph,
        zone,
        level_from,
        level_to,
        mode,
    })
}

pub fn version_of(text: &str) -> Option<u32> {
    VERSION_LABEL.captures(text)?.get(1)?.as_str().parse().ok()
}

pub fn phone_model_of(text: &str) -> Option<&str> {
    PHONE_MODEL_LABEL
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
