//! Timeline Rasterizer
//!
//! Compiles label files into the fixed-step AUTHOR brightness matrix and the
//! CUSTOM1 channel, and writes them as a `.cassette` document.

pub mod compiler;
pub mod grammar;
pub mod label;

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::codec::document::CassetteDocument;
use crate::codec::watermark::Watermark;
use crate::error::Result;

pub use compiler::{compile, light_level, snap_to_raster, CompiledLabels, ParsedLabel, TIME_STEP_MS};
pub use label::{format_label_line, label_document, Label, LabelFile};

/// Compile the label file at `label_path` into `<output_dir>/<stem>.cassette`.
///
/// Nothing is written when the labels are invalid.
pub fn compile_file(
    label_path: &Path,
    output_dir: &Path,
    watermark: Option<&Watermark>,
) -> Result<PathBuf> {
    let labels = LabelFile::read(label_path)?;
    let compiled = compile(&labels.labels)?;

    info!(
        "Compiled {} labels for {} into {} rows x {} columns",
        labels.len(),
        compiled.phone_model,
        compiled.author.row_count(),
        compiled.author.columns()
    );

    let document = CassetteDocument::encode(
        &compiled.author,
        &compiled.custom1,
        compiled.phone_model,
        watermark,
    )?;

    let stem = label_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Labels".to_string());
    fs::create_dir_all(output_dir)?;
    let output = output_dir.join(format!("{}.cassette", stem));
    document.write(&output)?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_compile_file_writes_cassette() {
        let dir = tempdir().unwrap();
        let labels = dir.path().join("Labels.txt");
        fs::write(
            &labels,
            "0.000000\t0.000000\tLABEL_VERSION=1\n\
             0.000000\t0.000000\tPHONE_MODEL=PHONE2A\n\
             0.000000\t1.000000\t1-100-LIN\n\
             2.000000\t2.000000\tEND\n",
        )
        .unwrap();

        let output = compile_file(&labels, dir.path(), None).unwrap();
        assert_eq!(output, dir.path().join("Labels.cassette"));

        let document = CassetteDocument::read(&output).unwrap();
        assert_eq!(document.author.len(), 121);
        assert_eq!(document.custom1, vec!["0-0".to_string()]);
    }

    #[test]
    fn test_invalid_labels_write_nothing() {
        let dir = tempdir().unwrap();
        let labels = dir.path().join("Broken.txt");
        fs::write(
            &labels,
            "0.000000\t0.000000\tLABEL_VERSION=1\n\
             0.000000\t0.000000\tPHONE_MODEL=PHONE2A\n\
             0.000000\t1.000000\t7-100-LIN\n",
        )
        .unwrap();

        assert!(compile_file(&labels, dir.path(), None).is_err());
        assert!(!dir.path().join("Broken.cassette").exists());
    }
}
