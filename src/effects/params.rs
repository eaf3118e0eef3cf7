//! Typed effect parameters
//!
//! Raw editor settings are resolved slot by slot into named arguments, then
//! read into one parameter struct per effect kind.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::registry::SettingSlot;

/// Named arguments resolved from an editor settings map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    values: HashMap<&'static str, Value>,
}

impl Args {
    /// Resolve every slot: the stored value, else the declared default, else
    /// the literal `1`; selector labels then map through their choice table.
    pub fn resolve(settings: &Map<String, Value>, slots: &[SettingSlot]) -> Self {
        let values = slots
            .iter()
            .map(|slot| {
                let raw = settings
                    .get(slot.slot)
                    .cloned()
                    .or_else(|| slot.default_value())
                    .unwrap_or_else(|| Value::from(1));
                (slot.key, slot.map_choice(raw))
            })
            .collect();
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Numeric argument; booleans count as 0/1 and numeric strings are parsed.
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.values.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Truthiness of an argument.
    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.values.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => Some(n.as_f64().map_or(false, |n| n != 0.0)),
            Value::String(s) => Some(!s.is_empty()),
            Value::Null => Some(false),
            _ => Some(true),
        }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// BPM snap multiplier, `None` when snapping is disabled.
    pub fn bpm_snap(&self, key: &str) -> Option<f64> {
        self.number(key).filter(|m| *m != 0.0)
    }

    fn level(&self, key: &str, fallback: u8) -> u8 {
        self.number(key)
            .map(|n| n.clamp(0.0, 100.0) as u8)
            .unwrap_or(fallback)
    }

    fn count(&self, key: &str, fallback: u32) -> u32 {
        self.number(key).map(|n| n.max(0.0) as u32).unwrap_or(fallback)
    }
}

/// Sweep direction of directional effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn sign(&self) -> i64 {
        match self {
            Side::Left => -1,
            Side::Right => 1,
        }
    }

    fn from_args(args: &Args, key: &str) -> Self {
        match args.number(key) {
            Some(n) if n < 0.0 => Side::Left,
            _ => Side::Right,
        }
    }
}

/// Which ends of the track a sidebeat animates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebeatPart {
    Left,
    Right,
    Both,
}

impl SidebeatPart {
    fn from_args(args: &Args) -> Self {
        match args.text("part") {
            Some("left") => SidebeatPart::Left,
            Some("right") => SidebeatPart::Right,
            _ => SidebeatPart::Both,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrobeParams {
    pub frequency: f64,
}

impl StrobeParams {
    pub fn from_args(args: &Args) -> Self {
        Self {
            frequency: args.number("frequency").unwrap_or(1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoftStrobeParams {
    pub frequency: f64,
    pub first_brightness: u8,
    pub second_brightness: u8,
    pub bpm_snap: Option<f64>,
}

impl SoftStrobeParams {
    pub fn from_args(args: &Args) -> Self {
        Self {
            frequency: args.number("frequency").unwrap_or(1.0),
            first_brightness: args.level("first_brightness", 100),
            second_brightness: args.level("second_brightness", 70),
            bpm_snap: args.bpm_snap("bpm_snap"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BpmParams {
    pub multiplier: f64,
}

impl BpmParams {
    pub fn from_args(args: &Args) -> Self {
        Self {
            multiplier: args.number("multiplier").unwrap_or(1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillParams {
    pub side: Side,
}

impl FillParams {
    pub fn from_args(args: &Args) -> Self {
        Self {
            side: Side::from_args(args, "side"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepParams {
    pub side: Side,
}

impl SweepParams {
    pub fn from_args(args: &Args) -> Self {
        Self {
            side: Side::from_args(args, "side"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SidebeatParams {
    pub part: SidebeatPart,
}

impl SidebeatParams {
    pub fn from_args(args: &Args) -> Self {
        Self {
            part: SidebeatPart::from_args(args),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZebraParams {
    pub fps: f64,
    pub on_count: u32,
    pub off_count: u32,
    pub side: Side,
    pub bpm_snap: Option<f64>,
}

impl ZebraParams {
    pub fn from_args(args: &Args) -> Self {
        Self {
            fps: args.number("fps").unwrap_or(1.0),
            on_count: args.count("on_count", 1),
            off_count: args.count("off_count", 1),
            side: Side::from_args(args, "side"),
            bpm_snap: args.bpm_snap("bpm_snap"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoomerangParams {
    pub jumps: u32,
}

impl BoomerangParams {
    pub fn from_args(args: &Args) -> Self {
        Self {
            jumps: args.count("jumps", 4),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShockerParams {
    pub frequency: f64,
    pub fade_out: bool,
    pub bpm_snap: Option<f64>,
}

impl ShockerParams {
    pub fn from_args(args: &Args) -> Self {
        Self {
            frequency: args.number("frequency").unwrap_or(5.0),
            fade_out: args.flag("fade_out").unwrap_or(true),
            bpm_snap: args.bpm_snap("bpm_snap"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlitchParams {
    pub fps: f64,
    /// Probability that a segment lights up in a frame.
    pub duty_cycle: f64,
    /// Minimal brightness in percent of the glyph brightness.
    pub min_brightness_ratio: f64,
    pub bpm_snap: Option<f64>,
}

impl GlitchParams {
    pub fn from_args(args: &Args) -> Self {
        Self {
            fps: args.number("fps").unwrap_or(20.0),
            duty_cycle: args.number("duty_cycle").unwrap_or(0.7),
            min_brightness_ratio: args.number("min_br_ratio").unwrap_or(30.0),
            bpm_snap: args.bpm_snap("bpm_snap"),
        }
    }
}
