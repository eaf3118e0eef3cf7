//! Label lines and label files
//!
//! A label is one tab-separated row `<start_s>\t<end_s>\t<text>`. Label files
//! carry two metadata pseudo-labels (`LABEL_VERSION=n`, `PHONE_MODEL=CODE`),
//! the light labels, and a single `END` label bounding the composition.

use std::fs;
use std::path::Path;

use crate::error::{CassetteError, Result};
use crate::topology::PhoneModel;

use super::grammar;

/// Format one label line with six decimals on both times.
pub fn format_label_line(time_from_s: f64, time_to_s: f64, text: &str) -> String {
    format!("{:.6}\t{:.6}\t{}", time_from_s, time_to_s, text)
}

/// Wrap label lines into a complete label document for `model`, ending at
/// `duration_s`.
pub fn label_document(model: PhoneModel, duration_s: f64, body: &[String]) -> String {
    let mut lines = Vec::with_capacity(body.len() + 3);
    lines.push(format_label_line(0.0, 0.0, "LABEL_VERSION=1"));
    lines.push(format_label_line(0.0, 0.0, &format!("PHONE_MODEL={}", model.code())));
    lines.extend(body.iter().cloned());
    lines.push(format_label_line(duration_s, duration_s, "END"));
    lines.join("\n")
}

fn round_millis(seconds: f64) -> f64 {
    (seconds * 1000.0 * 1000.0).round_ties_even() / 1000.0
}

/// One row of a label file.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub time_from_ms: f64,
    pub time_to_ms: f64,
    pub text: String,
    /// 1-based line number in the source file.
    pub line: usize,
}

impl Label {
    /// Create a label from times in seconds; times are kept in milliseconds
    /// rounded to three decimals.
    pub fn new(time_from_s: f64, time_to_s: f64, text: &str, line: usize) -> Self {
        Self {
            time_from_ms: round_millis(time_from_s),
            time_to_ms: round_millis(time_to_s),
            text: text.trim().to_string(),
            line,
        }
    }

    /// Parse a tab-separated row. Blank rows yield `None`.
    pub fn parse_row(row: &str, line: usize) -> Result<Option<Self>> {
        let row = row.trim_end_matches(['\r', '\n']);
        let columns: Vec<&str> = row.split('\t').map(str::trim_start).collect();
        if columns.first().map_or(true, |first| first.trim().is_empty()) {
            return Ok(None);
        }
        if columns.len() != 3 {
            return Err(CassetteError::MalformedLabel {
                line,
                reason: "the file should contain 3 columns: 'Time Start', 'Time End' and 'Label Text'"
                    .to_string(),
            });
        }

        let time_from = parse_time(columns[0], line)?;
        let time_to = parse_time(columns[1], line)?;
        Ok(Some(Self::new(time_from, time_to, columns[2], line)))
    }

    pub fn duration_ms(&self) -> f64 {
        self.time_to_ms - self.time_from_ms
    }

    pub fn is_end(&self) -> bool {
        self.text == "END"
    }

    /// Version carried by a `LABEL_VERSION=n` label.
    pub fn version(&self) -> Option<u32> {
        grammar::version_of(&self.text)
    }

    /// Model code carried by a `PHONE_MODEL=CODE` label.
    pub fn phone_model_code(&self) -> Option<&str> {
        grammar::phone_model_of(&self.text)
    }

    /// True for the pseudo-labels that never reach the matrix.
    pub fn is_metadata(&self) -> bool {
        self.is_end() || self.version().is_some() || self.phone_model_code().is_some()
    }
}

fn parse_time(column: &str, line: usize) -> Result<f64> {
    column
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| CassetteError::MalformedLabel {
            line,
            reason: format!("'{}' is not a time in seconds", column.trim()),
        })
}

/// An ordered list of labels, usually read from a `.txt` label file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelFile {
    pub labels: Vec<Label>,
}

impl LabelFile {
    pub fn parse(content: &str) -> Result<Self> {
        let mut labels = Vec::new();
        for (index, row) in content.lines().enumerate() {
            if let Some(label) = Label::parse_row(row, index + 1)? {
                labels.push(label);
            }
        }
        Ok(Self { labels })
    }

    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CassetteError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_row_rounds_and_trims() {
        let label = Label::parse_row("0,5\t1.0000004\t 1-50-LIN ", 3)
            .unwrap()
            .unwrap();
        assert_eq!(label.time_from_ms, 500.0);
        assert_eq!(label.time_to_ms, 1000.0);
        assert_eq!(label.text, "1-50-LIN");
        assert_eq!(label.line, 3);
    }

    #[test]
    fn test_blank_rows_are_skipped() {
        assert_eq!(Label::parse_row("", 1).unwrap(), None);
        assert_eq!(Label::parse_row("   \t", 1).unwrap(), None);
    }

    #[test]
    fn test_wrong_column_count() {
        let err = Label::parse_row("0.0\t1.0", 4).unwrap_err();
        assert!(matches!(err, CassetteError::MalformedLabel { line: 4, .. }));
    }

    #[test]
    fn test_metadata_labels() {
        let version = Label::new(0.0, 0.0, "LABEL_VERSION=1", 1);
        let model = Label::new(0.0, 0.0, "PHONE_MODEL=PHONE2A", 2);
        let end = Label::new(3.0, 3.0, "END", 9);
        assert_eq!(version.version(), Some(1));
        assert_eq!(model.phone_model_code(), Some("PHONE2A"));
        assert!(end.is_end());
        assert!(version.is_metadata() && model.is_metadata() && end.is_metadata());
        assert!(!Label::new(0.0, 1.0, "1-100-LIN", 3).is_metadata());
    }

    #[test]
    fn test_label_document() {
        let body = vec![format_label_line(0.0, 2.0, "1-100-LIN")];
        let document = label_document(PhoneModel::Phone2A, 5.5, &body);
        assert_eq!(
            document,
            "0.000000\t0.000000\tLABEL_VERSION=1\n\
             0.000000\t0.000000\tPHONE_MODEL=PHONE2A\n\
             0.000000\t2.000000\t1-100-LIN\n\
             5.500000\t5.500000\tEND"
        );
        assert_eq!(LabelFile::parse(&document).unwrap().len(), 4);
    }
}
