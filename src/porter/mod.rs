//! Model Porter
//!
//! Re-targets a composition from one phone model to another through the
//! correspondence tables in [`tables`]. Plain glyphs are relabelled; effect
//! glyphs are moved and expanded again on the destination model.

pub mod tables;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::codec::tagging::FFmpeg;
use crate::codec::watermark::Watermark;
use crate::composition::{export_label_document, Composition, Glyph};
use crate::effects::effect_to_label_lines;
use crate::error::{CassetteError, Result};
use crate::raster::label::label_document;
use crate::topology::PhoneModel;

pub use tables::{available_ports, port_table, zone_map, PortTable, TrackMapping};

impl TrackMapping {
    /// Concrete destination tracks for one glyph.
    pub fn resolve<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<String> {
        match self {
            TrackMapping::Direct(track) => vec![track.clone()],
            TrackMapping::DuplicateAll(tracks) => tracks.clone(),
            TrackMapping::SampleN(pool, n) => {
                let mut seen = HashSet::new();
                (0..*n)
                    .filter_map(|_| pool.choose(rng).cloned())
                    .filter(|track| seen.insert(track.clone()))
                    .collect()
            }
            TrackMapping::ChooseOne(sets) => sets.choose(rng).cloned().unwrap_or_default(),
        }
    }
}

fn unmapped(track: &str, from: PhoneModel, to: PhoneModel) -> CassetteError {
    CassetteError::UnmappedTrack {
        track: track.to_string(),
        from: from.code().to_string(),
        to: to.code().to_string(),
    }
}

/// Label lines of `composition` re-targeted from `from` to `to`.
///
/// Plain glyphs come first, then effect glyphs. The composition itself is
/// not modified.
pub fn port<R: Rng + ?Sized>(
    from: PhoneModel,
    to: PhoneModel,
    composition: &Composition,
    rng: &mut R,
) -> Result<(Vec<String>, PhoneModel)> {
    if composition.model != from {
        warn!(
            "Porting a {} composition as {}",
            composition.model.display_name(),
            from.display_name()
        );
    }

    let table = port_table(from, to)?;
    let bpm = composition.bpm();
    let (plain, effects) = composition.sorted_glyphs();
    let mut lines = Vec::new();

    for glyph in plain {
        let mapping = table
            .tracks
            .get(&glyph.track)
            .ok_or_else(|| unmapped(&glyph.track, from, to))?;
        for track in mapping.resolve(rng) {
            let ported = Glyph {
                track,
                ..glyph.clone()
            };
            lines.push(ported.to_label_line());
        }
    }

    for glyph in effects {
        let segmented = glyph.effect.as_ref().is_some_and(|e| e.is_segmented());
        let tracks = if segmented {
            table
                .segmented_effects
                .get(&glyph.track)
                .map(|track| vec![track.clone()])
                .ok_or_else(|| unmapped(&glyph.track, from, to))?
        } else {
            table
                .tracks
                .get(&glyph.track)
                .ok_or_else(|| unmapped(&glyph.track, from, to))?
                .resolve(rng)
        };

        for track in tracks {
            let ported = Glyph {
                track: track.clone(),
                ..glyph.clone()
            };
            lines.extend(effect_to_label_lines(&ported, to, bpm, Some(&track), rng)?);
        }
    }

    debug!(
        "Ported {} glyphs from {} to {} into {} labels",
        composition.glyphs.len(),
        from,
        to,
        lines.len()
    );
    Ok((lines, to))
}

/// Title of a ported export.
pub fn ported_title(model: PhoneModel) -> String {
    format!("Ported_withCassette_{}", model.code())
}

/// Compile ported label lines and tag them into a copy of `audio_path`.
pub fn export_port(
    lines: &[String],
    model: PhoneModel,
    duration_s: f64,
    audio_path: &Path,
    output_dir: &Path,
    watermark: Option<&Watermark>,
    ffmpeg: &FFmpeg,
) -> Result<PathBuf> {
    let document = label_document(model, duration_s, lines);
    let output = export_label_document(
        &document,
        audio_path,
        output_dir,
        &ported_title(model),
        watermark,
        ffmpeg,
    )?;
    info!("Exported port to {} as {}", model.display_name(), output.display());
    Ok(output)
}
