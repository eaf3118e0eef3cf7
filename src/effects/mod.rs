//! Effect Expansion Engine
//!
//! Turns a glyph carrying an effect into the concrete light segments that
//! reproduce it. Every kind is a closed variant with a typed parameter set;
//! expansion is pure apart from the explicit random source that Glitch
//! draws from.

pub mod params;
pub mod registry;
pub mod segment;
pub mod spatial;
pub mod temporal;

use log::debug;
use rand::Rng;
use serde_json::{Map, Value};

use crate::composition::{EffectDescriptor, Glyph};
use crate::error::{CassetteError, Result};
use crate::topology::PhoneModel;
use params::{
    Args, BoomerangParams, BpmParams, FillParams, GlitchParams, ShockerParams, SidebeatParams,
    SoftStrobeParams, StrobeParams, SweepParams, ZebraParams,
};
pub use segment::Segment;

/// Closed set of effect kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    FadeIn,
    FadeOut,
    FadeInOut,
    Strobe,
    SoftStrobe,
    Bpm,
    Fill,
    Sweep,
    Sidebeat,
    Zebra,
    Boomerang,
    Shocker,
    Glitch,
}

impl EffectKind {
    pub const ALL: [EffectKind; 13] = [
        EffectKind::FadeIn,
        EffectKind::FadeOut,
        EffectKind::FadeInOut,
        EffectKind::Strobe,
        EffectKind::SoftStrobe,
        EffectKind::Bpm,
        EffectKind::Fill,
        EffectKind::Sweep,
        EffectKind::Sidebeat,
        EffectKind::Zebra,
        EffectKind::Boomerang,
        EffectKind::Shocker,
        EffectKind::Glitch,
    ];

    /// Editor name of the effect.
    pub fn name(&self) -> &'static str {
        match self {
            EffectKind::FadeIn => "Fade in",
            EffectKind::FadeOut => "Fade out",
            EffectKind::FadeInOut => "Fade in + out",
            EffectKind::Strobe => "Strobe",
            EffectKind::SoftStrobe => "Soft Strobe",
            EffectKind::Bpm => "BPM",
            EffectKind::Fill => "Fill",
            EffectKind::Sweep => "Sweep",
            EffectKind::Sidebeat => "Sidebeat",
            EffectKind::Zebra => "Zebra",
            EffectKind::Boomerang => "Boomerang",
            EffectKind::Shocker => "Shocker",
            EffectKind::Glitch => "Glitch",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Whether the effect addresses individual sub-zones of a track.
    pub fn is_segmented(&self) -> bool {
        matches!(
            self,
            EffectKind::Fill
                | EffectKind::Sweep
                | EffectKind::Sidebeat
                | EffectKind::Zebra
                | EffectKind::Boomerang
                | EffectKind::Shocker
                | EffectKind::Glitch
        )
    }
}

/// An effect kind together with its resolved parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    FadeIn,
    FadeOut,
    FadeInOut,
    Strobe(StrobeParams),
    SoftStrobe(SoftStrobeParams),
    Bpm(BpmParams),
    Fill(FillParams),
    Sweep(SweepParams),
    Sidebeat(SidebeatParams),
    Zebra(ZebraParams),
    Boomerang(BoomerangParams),
    Shocker(ShockerParams),
    Glitch(GlitchParams),
}

impl Effect {
    /// Resolve an editor name and settings map. Unknown names and "None"
    /// yield `None`.
    pub fn from_settings(name: &str, settings: &Map<String, Value>) -> Option<Self> {
        let info = registry::lookup(name)?;
        let kind = info.kind?;
        let args = Args::resolve(settings, info.settings);

        Some(match kind {
            EffectKind::FadeIn => Effect::FadeIn,
            EffectKind::FadeOut => Effect::FadeOut,
            EffectKind::FadeInOut => Effect::FadeInOut,
            EffectKind::Strobe => Effect::Strobe(StrobeParams::from_args(&args)),
            EffectKind::SoftStrobe => Effect::SoftStrobe(SoftStrobeParams::from_args(&args)),
            EffectKind::Bpm => Effect::Bpm(BpmParams::from_args(&args)),
            EffectKind::Fill => Effect::Fill(FillParams::from_args(&args)),
            EffectKind::Sweep => Effect::Sweep(SweepParams::from_args(&args)),
            EffectKind::Sidebeat => Effect::Sidebeat(SidebeatParams::from_args(&args)),
            EffectKind::Zebra => Effect::Zebra(ZebraParams::from_args(&args)),
            EffectKind::Boomerang => Effect::Boomerang(BoomerangParams::from_args(&args)),
            EffectKind::Shocker => Effect::Shocker(ShockerParams::from_args(&args)),
            EffectKind::Glitch => Effect::Glitch(GlitchParams::from_args(&args)),
        })
    }

    pub fn from_descriptor(descriptor: &EffectDescriptor) -> Option<Self> {
        Self::from_settings(&descriptor.name, &descriptor.settings)
    }

    pub fn kind(&self) -> EffectKind {
        match self {
            Effect::FadeIn => EffectKind::FadeIn,
            Effect::FadeOut => EffectKind::FadeOut,
            Effect::FadeInOut => EffectKind::FadeInOut,
            Effect::Strobe(_) => EffectKind::Strobe,
            Effect::SoftStrobe(_) => EffectKind::SoftStrobe,
            Effect::Bpm(_) => EffectKind::Bpm,
            Effect::Fill(_) => EffectKind::Fill,
            Effect::Sweep(_) => EffectKind::Sweep,
            Effect::Sidebeat(_) => EffectKind::Sidebeat,
            Effect::Zebra(_) => EffectKind::Zebra,
            Effect::Boomerang(_) => EffectKind::Boomerang,
            Effect::Shocker(_) => EffectKind::Shocker,
            Effect::Glitch(_) => EffectKind::Glitch,
        }
    }

    /// Expand over `glyph` on `model`.
    ///
    /// # Arguments
    /// * `port_track` - Track whose segment count is used when the glyph's own
    ///   track has none on `model` (ported glyphs)
    /// * `rng` - Random source, only drawn from by Glitch
    pub fn expand<R: Rng + ?Sized>(
        &self,
        glyph: &Glyph,
        model: PhoneModel,
        bpm: f64,
        port_track: Option<&str>,
        rng: &mut R,
    ) -> Result<Vec<Segment>> {
        let span = Span::of(glyph, model, self.kind(), port_track)?;

        match self {
            Effect::FadeIn => Ok(temporal::fade_in(&span)),
            Effect::FadeOut => Ok(temporal::fade_out(&span)),
            Effect::FadeInOut => Ok(temporal::fade_in_out(&span)),
            Effect::Strobe(p) => temporal::strobe(&span, p),
            Effect::SoftStrobe(p) => temporal::soft_strobe(&span, p, bpm),
            Effect::Bpm(p) => temporal::bpm_pulse(&span, p, bpm),
            Effect::Fill(p) => Ok(spatial::fill(&span, p)),
            Effect::Sweep(p) => Ok(spatial::sweep(&span, p)),
            Effect::Sidebeat(p) => Ok(spatial::sidebeat(&span, p)),
            Effect::Zebra(p) => spatial::zebra(&span, p, bpm),
            Effect::Boomerang(p) => Ok(spatial::boomerang(&span, p)),
            Effect::Shocker(p) => spatial::shocker(&span, p, bpm),
            Effect::Glitch(p) => spatial::glitch(&span, p, bpm, rng),
        }
    }
}

/// Time span, brightness and segment count an effect works on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span<'a> {
    pub track: &'a str,
    /// Sub-zone count; 0 for non-segmented effects.
    pub segments: u32,
    pub start: f64,
    pub end: f64,
    pub duration: f64,
    pub brightness: u8,
}

impl<'a> Span<'a> {
    fn of(
        glyph: &'a Glyph,
        model: PhoneModel,
        kind: EffectKind,
        port_track: Option<&str>,
    ) -> Result<Self> {
        let segments = if kind.is_segmented() {
            model
                .segment_count(&glyph.track)
                .or_else(|| port_track.and_then(|track| model.segment_count(track)))
                .ok_or_else(|| CassetteError::MissingSegments {
                    track: glyph.track.clone(),
                    model: model.code().to_string(),
                    effect: kind.name().to_string(),
                })?
        } else {
            0
        };

        Ok(Self {
            track: &glyph.track,
            segments,
            start: glyph.start_ms,
            end: glyph.end_ms(),
            duration: glyph.duration_ms,
            brightness: glyph.brightness,
        })
    }
}

/// Interval in milliseconds of a per-second rate.
pub(crate) fn positive_interval(effect: &str, per_second: f64) -> Result<f64> {
    if per_second.is_finite() && per_second > 0.0 {
        Ok(1000.0 / per_second)
    } else {
        Err(CassetteError::InvalidEffectSetting {
            effect: effect.to_string(),
            reason: format!("rate must be positive, got {}", per_second),
        })
    }
}

pub(crate) fn level(value: i64) -> u8 {
    value.clamp(0, 100) as u8
}

/// Expand effect `name` with editor `settings` over `glyph`.
///
/// Unknown effect names expand to nothing.
pub fn expand<R: Rng + ?Sized>(
    name: &str,
    settings: &Map<String, Value>,
    glyph: &Glyph,
    model: PhoneModel,
    bpm: f64,
    rng: &mut R,
) -> Result<Vec<Segment>> {
    expand_for_track(name, settings, glyph, model, bpm, None, rng)
}

/// Like [`expand`], with a fallback track for the segment count.
pub fn expand_for_track<R: Rng + ?Sized>(
    name: &str,
    settings: &Map<String, Value>,
    glyph: &Glyph,
    model: PhoneModel,
    bpm: f64,
    port_track: Option<&str>,
    rng: &mut R,
) -> Result<Vec<Segment>> {
    match Effect::from_settings(name, settings) {
        Some(effect) => effect.expand(glyph, model, bpm, port_track, rng),
        None => {
            debug!("Effect '{}' has no expansion, skipping", name);
            Ok(Vec::new())
        }
    }
}

/// Segments of the effect attached to `glyph`, empty when it has none.
pub fn effect_to_segments<R: Rng + ?Sized>(
    glyph: &Glyph,
    model: PhoneModel,
    bpm: f64,
    rng: &mut R,
) -> Result<Vec<Segment>> {
    match &glyph.effect {
        Some(effect) => expand(&effect.name, &effect.settings, glyph, model, bpm, rng),
        None => Ok(Vec::new()),
    }
}

/// Label lines of the effect attached to `glyph`.
pub fn effect_to_label_lines<R: Rng + ?Sized>(
    glyph: &Glyph,
    model: PhoneModel,
    bpm: f64,
    port_track: Option<&str>,
    rng: &mut R,
) -> Result<Vec<String>> {
    let segments = match &glyph.effect {
        Some(effect) => expand_for_track(
            &effect.name,
            &effect.settings,
            glyph,
            model,
            bpm,
            port_track,
            rng,
        )?,
        None => Vec::new(),
    };
    Ok(segment::to_label_lines(&segments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_unknown_effect_is_noop() {
        let glyph = Glyph::new("1", 0.0, 1000.0, 100);
        let out = expand("Disco", &Map::new(), &glyph, PhoneModel::Phone2A, 120.0, &mut rng()).unwrap();
        assert!(out.is_empty());

        let none = expand("None", &Map::new(), &glyph, PhoneModel::Phone2A, 120.0, &mut rng()).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_segmented_effect_on_plain_track_fails() {
        let glyph = Glyph::new("2", 0.0, 1000.0, 100);
        let err = expand("Fill", &Map::new(), &glyph, PhoneModel::Phone2A, 120.0, &mut rng())
            .unwrap_err();
        assert_eq!(err.error_code(), "MISSING_SEGMENTS");
    }

    #[test]
    fn test_port_track_supplies_segments() {
        let glyph = Glyph::new("3", 0.0, 1000.0, 100);
        let out = expand_for_track(
            "Sweep",
            &Map::new(),
            &glyph,
            PhoneModel::Phone1,
            120.0,
            Some("4"),
            &mut rng(),
        )
        .unwrap();
        assert_eq!(out.len(), 15);
        assert_eq!(out[0].track, "3.8");
    }

    #[test]
    fn test_fill_on_phone2a_main_track() {
        let glyph = Glyph::new("1", 0.0, 2400.0, 100);
        let settings = json!({"selector1": "To the right"});
        let out = expand(
            "Fill",
            settings.as_object().unwrap(),
            &glyph,
            PhoneModel::Phone2A,
            120.0,
            &mut rng(),
        )
        .unwrap();
        assert_eq!(out.len(), 24);
        assert_eq!(out[1].track, "1.2");
        assert_eq!(out[1].start_ms, 100.0);
    }

    #[test]
    fn test_effect_label_lines() {
        let glyph = Glyph::new("2", 0.0, 1000.0, 60).with_effect(EffectDescriptor::new("Fade in"));
        let lines = effect_to_label_lines(&glyph, PhoneModel::Phone3A, 120.0, None, &mut rng()).unwrap();
        assert_eq!(lines, vec!["0.000000\t1.000000\t2-0-60-LIN".to_string()]);
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in EffectKind::ALL {
            assert_eq!(EffectKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(EffectKind::from_name("None"), None);
    }
}
