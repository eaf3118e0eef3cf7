//! Label-to-matrix compilation

use log::{debug, warn};

use super::grammar::{self, LightLabel, LightMode};
use super::label::Label;
use crate::codec::author::{AuthorData, Custom1Data};
use crate::error::{CassetteError, Result};
use crate::topology::{self, ColumnsModel, PhoneModel};

/// Raster step in milliseconds.
pub const TIME_STEP_MS: f64 = 16.666;

/// Light level of 100 %.
pub const MAX_LIGHT_LEVEL: u32 = 4095;

const SUPPORTED_LABEL_VERSIONS: &[u32] = &[1];

/// Snap `ms` to the nearest raster grid point.
pub fn snap_to_raster(ms: f64) -> f64 {
    (ms / TIME_STEP_MS).round_ties_even() * TIME_STEP_MS
}

/// Number of raster rows needed to cover `ms`.
pub fn raster_rows(ms: f64) -> usize {
    (ms / TIME_STEP_MS).ceil().max(0.0) as usize
}

/// Absolute light level of a brightness percentage.
pub fn light_level(percent: u8) -> u32 {
    (f64::from(percent) * f64::from(MAX_LIGHT_LEVEL) / 100.0).round_ties_even() as u32
}

/// A light label resolved against a columns model.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLabel {
    pub rastered_from_ms: f64,
    pub rastered_to_ms: f64,
    pub indices: Vec<usize>,
    pub custom_5col_id: usize,
    pub level_from: u32,
    pub level_to: u32,
    pub mode: LightMode,
    pub is_zone_label: bool,
}

impl ParsedLabel {
    pub fn new(label: &Label, light: &LightLabel, columns: ColumnsModel) -> Result<Self> {
        let rastered_from_ms = snap_to_raster(label.time_from_ms);
        let mut rastered_to_ms = snap_to_raster(label.time_to_ms);
        if rastered_to_ms - rastered_from_ms == 0.0 {
            rastered_to_ms += TIME_STEP_MS;
        }

        Ok(Self {
            rastered_from_ms,
            rastered_to_ms,
            indices: topology::resolve(light.glyph, light.zone, columns)?,
            custom_5col_id: topology::canonical_5col_id(light.glyph, columns)?,
            level_from: light_level(light.level_from),
            level_to: light_level(light.level_to),
            mode: light.mode,
            is_zone_label: light.is_zone_label(),
        })
    }

    /// Raster rows covered by the label.
    pub fn steps(&self) -> std::ops::Range<i64> {
        let from = (self.rastered_from_ms / TIME_STEP_MS).round_ties_even() as i64;
        let to = (self.rastered_to_ms / TIME_STEP_MS).round_ties_even() as i64;
        from..to
    }

    /// Light level of step `index` out of `count`.
    pub fn level_at(&self, index: usize, count: usize) -> u32 {
        let from = f64::from(self.level_from);
        let to = f64::from(self.level_to);
        let offset = if self.level_from <= self.level_to { 1 } else { 0 };
        let value = from + (to - from) / count as f64 * (index + offset) as f64;
        value.round_ties_even().max(0.0) as u32
    }
}

/// Output of a successful compile.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledLabels {
    pub phone_model: PhoneModel,
    pub columns_model: ColumnsModel,
    pub label_version: u32,
    pub author: AuthorData,
    pub custom1: Custom1Data,
    /// Cells written over a non-zero value by a later label.
    pub overwrites: usize,
}

fn find_phone_model(labels: &[Label]) -> Result<PhoneModel> {
    let code = labels
        .iter()
        .filter_map(Label::phone_model_code)
        .last()
        .ok_or(CassetteError::MissingPhoneModel)?;
    code.parse()
}

/// Compile labels into the AUTHOR matrix and CUSTOM1 channel.
///
/// The whole compile fails on the first invalid label; nothing partial is
/// returned.
pub fn compile(labels: &[Label]) -> Result<CompiledLabels> {
    let phone_model = find_phone_model(labels)?;

    let mut end_label: Option<&Label> = None;
    let mut label_version = None;
    let mut lights: Vec<(&Label, LightLabel)> = Vec::new();

    for label in labels {
        if label.is_end() {
            if end_label.is_some() {
                return Err(CassetteError::DuplicateEndLabel { line: label.line });
            }
            end_label = Some(label);
        } else if let Some(version) = label.version() {
            label_version.get_or_insert(version);
        } else if label.phone_model_code().is_none() {
            let light = grammar::parse_light_label(&label.text, phone_model).ok_or_else(|| {
                CassetteError::LabelGrammar {
                    line: label.line,
                    text: label.text.clone(),
                    model: phone_model.code().to_string(),
                }
            })?;
            if light.mode != LightMode::Lin {
                return Err(CassetteError::UnsupportedLightMode {
                    line: label.line,
                    mode: light.mode.to_string(),
                });
            }
            lights.push((label, light));
        }
    }

    let end_label = end_label.ok_or(CassetteError::MissingEndLabel)?;
    let label_version = label_version.ok_or(CassetteError::MissingLabelVersion)?;
    if !SUPPORTED_LABEL_VERSIONS.contains(&label_version) {
        return Err(CassetteError::UnsupportedLabelVersion {
            version: label_version,
        });
    }

    if !lights
        .windows(2)
        .all(|pair| pair[0].0.time_from_ms <= pair[1].0.time_from_ms)
    {
        lights.sort_by(|a, b| a.0.time_from_ms.total_cmp(&b.0.time_from_ms));
    }

    let has_zone_labels = lights.iter().any(|(_, light)| light.is_zone_label());
    let columns_model = ColumnsModel::for_phone(phone_model, has_zone_labels);
    let rows = raster_rows(end_label.time_to_ms);
    if rows == 0 {
        return Err(CassetteError::MalformedLabel {
            line: end_label.line,
            reason: "END label must end after the start of the composition".to_string(),
        });
    }

    let mut author = AuthorData::zeroed(rows, columns_model.zone_count());
    let mut custom1 = Custom1Data::new();
    let mut overwrites = 0;
    let mut clipped = 0;

    for (label, light) in &lights {
        let parsed = ParsedLabel::new(label, light, columns_model)?;
        let steps = parsed.steps();
        let count = steps.clone().count();

        for (i, row) in steps.enumerate() {
            let level = parsed.level_at(i, count);
            for &index in &parsed.indices {
                let previous = usize::try_from(row)
                    .ok()
                    .and_then(|row| author.set(row, index, level));
                match previous {
                    Some(0) => {}
                    Some(_) => overwrites += 1,
                    None => clipped += 1,
                }
            }
        }

        custom1.push(
            label.time_from_ms.round_ties_even() as i64,
            parsed.custom_5col_id,
        );
    }

    if clipped > 0 {
        warn!(
            "{} light cells fell outside the {} rows bounded by END and were dropped",
            clipped, rows
        );
    }
    if overwrites > 0 {
        debug!("{} cells were overwritten by overlapping labels", overwrites);
    }

    Ok(CompiledLabels {
        phone_model,
        columns_model,
        label_version,
        author,
        custom1,
        overwrites,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::label::LabelFile;
    use pretty_assertions::assert_eq;

    fn labels(body: &str, model: &str) -> Vec<Label> {
        let content = format!(
            "0.000000\t0.000000\tLABEL_VERSION=1\n0.000000\t0.000000\tPHONE_MODEL={}\n{}",
            model, body
        );
        LabelFile::parse(&content).unwrap().labels
    }

    #[test]
    fn test_end_at_zero_is_rejected() {
        let err = compile(&labels("0.000000\t0.000000\tEND", "PHONE1")).unwrap_err();
        assert!(err.is_validation());
        match err {
            CassetteError::MalformedLabel { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_light_level_rounding() {
        assert_eq!(light_level(50), 2048);
        assert_eq!(light_level(100), 4095);
        assert_eq!(light_level(0), 0);
        assert_eq!(light_level(1), 41);
    }

    #[test]
    fn test_single_glyph_five_zone() {
        let compiled = compile(&labels(
            "0.000000\t1.000000\t1-50-LIN\n1.000000\t1.000000\tEND",
            "PHONE1",
        ))
        .unwrap();

        assert_eq!(compiled.columns_model, ColumnsModel::FiveZone);
        assert_eq!(compiled.author.row_count(), 61);
        for row in 0..60 {
            assert_eq!(compiled.author.get(row, 0), Some(2048));
            assert_eq!(compiled.author.get(row, 1), Some(0));
        }
        assert_eq!(compiled.author.get(60, 0), Some(0));
        assert_eq!(compiled.custom1.to_entries(), vec!["0-0"]);
    }

    #[test]
    fn test_zone_labels_select_zoned_variant() {
        let compiled = compile(&labels(
            "0.0\t0.5\t1.24-100\n2.0\t2.0\tEND",
            "PHONE2A",
        ))
        .unwrap();
        assert_eq!(compiled.columns_model, ColumnsModel::TwentySixZone);
        assert_eq!(compiled.author.columns(), 26);
    }

    #[test]
    fn test_ramp_up_starts_one_step_in() {
        let compiled = compile(&labels(
            "0.0\t0.066664\t1-0-100\n1.0\t1.0\tEND",
            "PHONE3A",
        ))
        .unwrap();
        // Four steps from 0 to 4095.
        let column: Vec<u32> = (0..4).filter_map(|r| compiled.author.get(r, 0)).collect();
        assert_eq!(column, vec![1024, 2048, 3071, 4095]);
    }

    #[test]
    fn test_ramp_down_starts_at_from_level() {
        let compiled = compile(&labels(
            "0.0\t0.066664\t1-100-0\n1.0\t1.0\tEND",
            "PHONE3A",
        ))
        .unwrap();
        let column: Vec<u32> = (0..4).filter_map(|r| compiled.author.get(r, 0)).collect();
        assert_eq!(column, vec![4095, 3071, 2048, 1024]);
    }

    #[test]
    fn test_zero_length_label_takes_one_step() {
        let compiled = compile(&labels("0.5\t0.5\t2-100\n1.0\t1.0\tEND", "PHONE2A")).unwrap();
        let row = (500.0 / TIME_STEP_MS).round() as usize;
        assert_eq!(compiled.author.get(row, 24), Some(4095));
        assert_eq!(compiled.author.get(row + 1, 24), Some(0));
    }

    #[test]
    fn test_overlaps_are_counted_last_writer_wins() {
        let compiled = compile(&labels(
            "0.0\t1.0\t1-100\n0.5\t1.0\t1-10\n1.0\t1.0\tEND",
            "PHONE1",
        ))
        .unwrap();
        assert_eq!(compiled.overwrites, 30);
        assert_eq!(compiled.author.get(45, 0), Some(light_level(10)));
    }

    #[test]
    fn test_unsorted_labels_are_sorted() {
        let compiled = compile(&labels(
            "0.5\t1.0\t1-10\n0.0\t1.0\t1-100\n1.0\t1.0\tEND",
            "PHONE1",
        ))
        .unwrap();
        assert_eq!(compiled.custom1.to_entries(), vec!["0-0", "500-0"]);
        assert_eq!(compiled.author.get(45, 0), Some(light_level(10)));
    }

    #[test]
    fn test_missing_end() {
        let err = compile(&labels("0.0\t1.0\t1-100", "PHONE1")).unwrap_err();
        assert!(matches!(err, CassetteError::MissingEndLabel));
    }

    #[test]
    fn test_duplicate_end() {
        let err = compile(&labels("1.0\t1.0\tEND\n2.0\t2.0\tEND", "PHONE1")).unwrap_err();
        assert!(matches!(err, CassetteError::DuplicateEndLabel { line: 4 }));
    }

    #[test]
    fn test_grammar_error_reports_line() {
        let err = compile(&labels("0.0\t1.0\t9-100\n1.0\t1.0\tEND", "PHONE2A")).unwrap_err();
        match err {
            CassetteError::LabelGrammar { line, text, model } => {
                assert_eq!(line, 3);
                assert_eq!(text, "9-100");
                assert_eq!(model, "PHONE2A");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_exp_mode_rejected() {
        let err = compile(&labels("0.0\t1.0\t1-0-100-EXP\n1.0\t1.0\tEND", "PHONE1")).unwrap_err();
        assert!(matches!(err, CassetteError::UnsupportedLightMode { line: 3, .. }));
    }

    #[test]
    fn test_version_checks() {
        let content = "0.0\t0.0\tPHONE_MODEL=PHONE1\n1.0\t1.0\tEND";
        let err = compile(&LabelFile::parse(content).unwrap().labels).unwrap_err();
        assert!(matches!(err, CassetteError::MissingLabelVersion));

        let content = "0.0\t0.0\tLABEL_VERSION=2\n0.0\t0.0\tPHONE_MODEL=PHONE1\n1.0\t1.0\tEND";
        let err = compile(&LabelFile::parse(content).unwrap().labels).unwrap_err();
        assert!(matches!(err, CassetteError::UnsupportedLabelVersion { version: 2 }));
    }

    #[test]
    fn test_missing_phone_model() {
        let content = "0.0\t0.0\tLABEL_VERSION=1\n1.0\t1.0\tEND";
        let err = compile(&LabelFile::parse(content).unwrap().labels).unwrap_err();
        assert!(matches!(err, CassetteError::MissingPhoneModel));
    }
}
