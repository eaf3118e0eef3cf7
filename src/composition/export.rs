//! Composition export: labels, cassette, tagged audio

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use rand::Rng;

use super::project::Composition;
use crate::codec::tagging::{tag_audio, FFmpeg};
use crate::codec::watermark::Watermark;
use crate::error::Result;
use crate::raster::compile_file;

/// Title of a composition export.
pub const COMPOSED_TITLE: &str = "Composed_withCassette";

/// Scratch directory for intermediate label and cassette files.
pub const CACHE_DIR: &str = "Cache";

/// Compile a label document and write it into a copy of `audio_path`
/// named `<output_dir>/<title><ext>`.
///
/// The label and cassette files are kept in `<output_dir>/Cache`.
pub fn export_label_document(
    document: &str,
    audio_path: &Path,
    output_dir: &Path,
    title: &str,
    watermark: Option<&Watermark>,
    ffmpeg: &FFmpeg,
) -> Result<PathBuf> {
    let cache = output_dir.join(CACHE_DIR);
    fs::create_dir_all(&cache)?;

    let labels_path = cache.join("Labels.txt");
    fs::write(&labels_path, document)?;

    let cassette = compile_file(&labels_path, &cache, watermark)?;
    tag_audio(ffmpeg, audio_path, &cassette, output_dir, title)
}

/// Export `composition` over `audio_path` as `Composed_withCassette`.
pub fn export_composition<R: Rng + ?Sized>(
    composition: &Composition,
    audio_path: &Path,
    output_dir: &Path,
    watermark: Option<&Watermark>,
    ffmpeg: &FFmpeg,
    rng: &mut R,
) -> Result<PathBuf> {
    let document = composition.to_label_document(rng)?;
    let output = export_label_document(
        &document,
        audio_path,
        output_dir,
        COMPOSED_TITLE,
        watermark,
        ffmpeg,
    )?;
    info!("Exported {} glyphs to {}", composition.glyphs.len(), output.display());
    Ok(output)
}
