//! Editor-facing effect descriptors
//!
//! Titles, preview animations, slot kinds, ranges and choice maps for every
//! effect the editor offers. Expansion only reads the slot keys and choice
//! maps from here; everything else is for the collaborator UI.

use serde_json::Value;

use super::EffectKind;
use crate::topology::PhoneModel;

/// Value a selector choice maps to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChoiceValue {
    /// The "Disabled" entry of a BPM snap selector.
    Off,
    Number(f64),
    Text(&'static str),
}

impl ChoiceValue {
    pub fn to_value(self) -> Value {
        match self {
            ChoiceValue::Off => Value::Bool(false),
            ChoiceValue::Number(n) => Value::from(n),
            ChoiceValue::Text(s) => Value::from(s),
        }
    }
}

/// How the editor presents a setting slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlotKind {
    Selector {
        choices: &'static [(&'static str, ChoiceValue)],
        default: Option<&'static str>,
    },
    Slider {
        min: i64,
        max: i64,
        offset: i64,
    },
    Checkbox {
        default: bool,
    },
}

/// One editor setting slot (`slider1`, `selector2`, ...).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettingSlot {
    pub slot: &'static str,
    pub title: &'static str,
    /// Parameter name the slot feeds.
    pub key: &'static str,
    pub kind: SlotKind,
}

impl SettingSlot {
    /// Declared default, before choice mapping.
    pub fn default_value(&self) -> Option<Value> {
        match self.kind {
            SlotKind::Selector { default, .. } => default.map(Value::from),
            SlotKind::Checkbox { default } => Some(Value::Bool(default)),
            SlotKind::Slider { .. } => None,
        }
    }

    /// Map a selector choice label to its value; anything else passes through.
    pub fn map_choice(&self, value: Value) -> Value {
        if let (SlotKind::Selector { choices, .. }, Value::String(label)) = (&self.kind, &value) {
            if let Some((_, mapped)) = choices.iter().find(|(choice, _)| choice == label) {
                return mapped.to_value();
            }
        }
        value
    }
}

/// Editor description of one effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectInfo {
    pub name: &'static str,
    /// `None` for the "None" entry, which clears the effect.
    pub kind: Option<EffectKind>,
    pub gif: &'static str,
    pub segmented: bool,
    pub settings: &'static [SettingSlot],
}

const SIDE: &[(&str, ChoiceValue)] = &[
    ("To the left", ChoiceValue::Number(-1.0)),
    ("To the right", ChoiceValue::Number(1.0)),
];

const BPM_SNAP: &[(&str, ChoiceValue)] = &[
    ("Disabled", ChoiceValue::Off),
    ("BPM /2", ChoiceValue::Number(0.5)),
    ("BPM", ChoiceValue::Number(1.0)),
    ("BPM x2", ChoiceValue::Number(2.0)),
    ("BPM x4", ChoiceValue::Number(4.0)),
];

const BPM_MULTIPLIER: &[(&str, ChoiceValue)] = &[
    ("BPM /2", ChoiceValue::Number(0.5)),
    ("BPM", ChoiceValue::Number(1.0)),
    ("BPM x2", ChoiceValue::Number(2.0)),
    ("BPM x4", ChoiceValue::Number(4.0)),
];

const SIDEBEAT_PART: &[(&str, ChoiceValue)] = &[
    ("Left", ChoiceValue::Text("left")),
    ("Both", ChoiceValue::Text("both")),
    ("Right", ChoiceValue::Text("right")),
];

const DUTY_CYCLE: &[(&str, ChoiceValue)] = &[
    ("Less", ChoiceValue::Number(0.3)),
    ("More", ChoiceValue::Number(0.7)),
];

const fn selector(slot: &'static str, title: &'static str, key: &'static str, choices: &'static [(&'static str, ChoiceValue)]) -> SettingSlot {
    SettingSlot {
        slot,
        title,
        key,
        kind: SlotKind::Selector {
            choices,
            default: None,
        },
    }
}

const fn slider(slot: &'static str, title: &'static str, key: &'static str, min: i64, max: i64, offset: i64) -> SettingSlot {
    SettingSlot {
        slot,
        title,
        key,
        kind: SlotKind::Slider { min, max, offset },
    }
}

const fn snap(slot: &'static str) -> SettingSlot {
    selector(slot, "Snap to BPM", "bpm_snap", BPM_SNAP)
}

/// Every effect offered by the editor, in menu order.
pub const EFFECTS: &[EffectInfo] = &[
    EffectInfo {
        name: "None",
        kind: None,
        gif: "System/Media/Effects/None.gif",
        segmented: false,
        settings: &[],
    },
    EffectInfo {
        name: "Fade out",
        kind: Some(EffectKind::FadeOut),
        gif: "System/Media/Effects/FadeOut.gif",
        segmented: false,
        settings: &[],
    },
    EffectInfo {
        name: "Fade in",
        kind: Some(EffectKind::FadeIn),
        gif: "System/Media/Effects/FadeIn.gif",
        segmented: false,
        settings: &[],
    },
    EffectInfo {
        name: "Fade in + out",
        kind: Some(EffectKind::FadeInOut),
        gif: "System/Media/Effects/FadeInOut.gif",
        segmented: false,
        settings: &[],
    },
    EffectInfo {
        name: "Fill",
        kind: Some(EffectKind::Fill),
        gif: "System/Media/Effects/Fill.gif",
        segmented: true,
        settings: &[selector("selector1", "Side", "side", SIDE)],
    },
    EffectInfo {
        name: "Zebra",
        kind: Some(EffectKind::Zebra),
        gif: "System/Media/Effects/Zebra.gif",
        segmented: true,
        settings: &[
            snap("selector1"),
            selector("selector2", "Side", "side", SIDE),
            slider("slider3", "Moves per second", "fps", 1, 20, 1),
            slider("slider4", "Lit segments in a row", "on_count", 1, 5, 1),
            slider("slider5", "Dark segments in a row", "off_count", 1, 5, 1),
        ],
    },
    EffectInfo {
        name: "Strobe",
        kind: Some(EffectKind::Strobe),
        gif: "System/Media/Effects/Strobe.gif",
        segmented: false,
        settings: &[slider("slider1", "Strobes per second", "frequency", 1, 15, 1)],
    },
    EffectInfo {
        name: "Soft Strobe",
        kind: Some(EffectKind::SoftStrobe),
        gif: "System/Media/Effects/SoftStrobe.gif",
        segmented: false,
        settings: &[
            snap("selector1"),
            slider("slider2", "Strobes per second", "frequency", 1, 20, 1),
            slider("slider3", "First brightness", "first_brightness", 5, 100, 1),
            slider("slider4", "Second brightness", "second_brightness", 5, 100, 1),
        ],
    },
    EffectInfo {
        name: "Shocker",
        kind: Some(EffectKind::Shocker),
        gif: "System/Media/Effects/Shocker.gif",
        segmented: true,
        settings: &[
            snap("selector1"),
            slider("slider2", "Shocks per second", "frequency", 1, 15, 1),
            SettingSlot {
                slot: "checkbox3",
                title: "Enable fade out",
                key: "fade_out",
                kind: SlotKind::Checkbox { default: true },
            },
        ],
    },
    EffectInfo {
        name: "Sweep",
        kind: Some(EffectKind::Sweep),
        gif: "System/Media/Effects/Sweep.gif",
        segmented: true,
        settings: &[selector("selector1", "Side", "side", SIDE)],
    },
    EffectInfo {
        name: "Glitch",
        kind: Some(EffectKind::Glitch),
        gif: "System/Media/Effects/Glitch.gif",
        segmented: true,
        settings: &[
            snap("selector1"),
            slider("slider2", "Glitches per second", "fps", 1, 30, 1),
            slider("slider3", "Minimal brightness", "min_br_ratio", 1, 100, 1),
            selector("selector4", "Glitch fill level", "duty_cycle", DUTY_CYCLE),
        ],
    },
    EffectInfo {
        name: "BPM",
        kind: Some(EffectKind::Bpm),
        gif: "System/Media/Effects/BPM.gif",
        segmented: false,
        settings: &[SettingSlot {
            slot: "selector1",
            title: "Select BPM",
            key: "multiplier",
            kind: SlotKind::Selector {
                choices: BPM_MULTIPLIER,
                default: Some("BPM"),
            },
        }],
    },
    EffectInfo {
        name: "Sidebeat",
        kind: Some(EffectKind::Sidebeat),
        gif: "System/Media/Effects/Sidebeat.gif",
        segmented: true,
        settings: &[SettingSlot {
            slot: "selector1",
            title: "Side",
            key: "part",
            kind: SlotKind::Selector {
                choices: SIDEBEAT_PART,
                default: Some("Both"),
            },
        }],
    },
    EffectInfo {
        name: "Boomerang",
        kind: Some(EffectKind::Boomerang),
        gif: "System/Media/Effects/Boomerang.gif",
        segmented: true,
        settings: &[slider("slider1", "Jumps", "jumps", 4, 12, 2)],
    },
];

/// Find an effect by its editor name.
pub fn lookup(name: &str) -> Option<&'static EffectInfo> {
    EFFECTS.iter().find(|info| info.name == name)
}

/// Effects the editor may offer for `track`; segmented effects only appear on
/// segmented tracks.
pub fn effects_for_track(model: PhoneModel, track: &str) -> Vec<&'static EffectInfo> {
    let segmented_track = model.segment_count(track).is_some();
    EFFECTS
        .iter()
        .filter(|info| segmented_track || !info.segmented)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_is_registered() {
        for kind in EffectKind::ALL {
            let info = lookup(kind.name()).unwrap();
            assert_eq!(info.kind, Some(kind));
            assert_eq!(info.segmented, kind.is_segmented());
        }
    }

    #[test]
    fn test_plain_track_hides_segmented_effects() {
        let plain = effects_for_track(PhoneModel::Phone2A, "2");
        assert!(plain.iter().all(|info| !info.segmented));
        assert!(plain.iter().any(|info| info.name == "Strobe"));

        let segmented = effects_for_track(PhoneModel::Phone2A, "1");
        assert_eq!(segmented.len(), EFFECTS.len());
    }

    #[test]
    fn test_choice_mapping() {
        let slot = snap("selector1");
        assert_eq!(slot.map_choice(Value::from("BPM x2")), Value::from(2.0));
        assert_eq!(slot.map_choice(Value::from("Disabled")), Value::Bool(false));
        assert_eq!(slot.map_choice(Value::from(0.5)), Value::from(0.5));
    }
}
