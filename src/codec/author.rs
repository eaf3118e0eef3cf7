//! AUTHOR and CUSTOM1 channel data

use crate::error::{CassetteError, Result};
use crate::topology::ColumnsModel;

/// Frame x column brightness matrix; every row has the same width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorData {
    rows: Vec<Vec<u32>>,
    columns: usize,
}

impl AuthorData {
    /// Create an all-dark matrix.
    pub fn zeroed(rows: usize, columns: usize) -> Self {
        Self {
            rows: vec![vec![0; columns]; rows],
            columns,
        }
    }

    /// Build from rows, rejecting ragged input.
    pub fn from_rows(rows: Vec<Vec<u32>>) -> Result<Self> {
        let columns = rows.first().map(Vec::len).ok_or_else(|| {
            CassetteError::MalformedDocument {
                reason: "AUTHOR data has no rows".to_string(),
            }
        })?;
        for (index, row) in rows.iter().enumerate() {
            if row.len() != columns {
                return Err(CassetteError::RaggedAuthorData {
                    row: index + 1,
                    expected: columns,
                    found: row.len(),
                });
            }
        }
        Ok(Self { rows, columns })
    }

    /// Parse `"v1,v2,...,vn,"` lines. Blank lines are skipped.
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Result<Self> {
        let mut rows = Vec::with_capacity(lines.len());
        for line in lines {
            let line = line.as_ref();
            if line.replace(',', "").trim().is_empty() {
                continue;
            }
            let row = line
                .split(',')
                .map(str::trim)
                .filter(|cell| !cell.is_empty())
                .map(|cell| {
                    cell.parse::<u32>().map_err(|_| CassetteError::MalformedDocument {
                        reason: format!("AUTHOR cell '{}' is not a light level", cell),
                    })
                })
                .collect::<Result<Vec<u32>>>()?;
            rows.push(row);
        }
        Self::from_rows(rows)
    }

    pub fn to_lines(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| {
                let mut line = String::with_capacity(row.len() * 5);
                for value in row {
                    line.push_str(&value.to_string());
                    line.push(',');
                }
                line
            })
            .collect()
    }

    /// Lines joined with CRLF, including a trailing CRLF.
    pub fn raw_bytes(&self) -> Vec<u8> {
        let mut raw = self.to_lines().join("\r\n");
        raw.push_str("\r\n");
        raw.into_bytes()
    }

    pub fn rows(&self) -> &[Vec<u32>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn columns_model(&self) -> Result<ColumnsModel> {
        ColumnsModel::from_column_count(self.columns)
    }

    pub fn get(&self, row: usize, column: usize) -> Option<u32> {
        self.rows.get(row).and_then(|r| r.get(column)).copied()
    }

    /// Write a cell, returning the previous value. Out-of-range writes are
    /// ignored and return `None`.
    pub fn set(&mut self, row: usize, column: usize, value: u32) -> Option<u32> {
        let cell = self.rows.get_mut(row)?.get_mut(column)?;
        Some(std::mem::replace(cell, value))
    }

    pub fn push_zero_row(&mut self) {
        self.rows.push(vec![0; self.columns]);
    }

    /// Flatten row-major.
    pub fn cells(&self) -> impl Iterator<Item = u32> + '_ {
        self.rows.iter().flatten().copied()
    }
}

/// Simplified `(timestamp_ms, canonical 5-column id)` channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Custom1Data {
    entries: Vec<(i64, usize)>,
}

impl Custom1Data {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `"<timestamp>-<id>"` entries. Blank entries are skipped.
    pub fn from_entries<S: AsRef<str>>(entries: &[S]) -> Result<Self> {
        let mut parsed = Vec::with_capacity(entries.len());
        for entry in entries {
            let entry = entry.as_ref();
            if entry.trim().is_empty() {
                continue;
            }
            let parts: Vec<&str> = entry
                .split('-')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .collect();
            let invalid = || CassetteError::InvalidCustom1 {
                entry: entry.to_string(),
            };
            match parts.as_slice() {
                [timestamp, id] => parsed.push((
                    timestamp.parse().map_err(|_| invalid())?,
                    id.parse().map_err(|_| invalid())?,
                )),
                _ => return Err(invalid()),
            }
        }
        Ok(Self { entries: parsed })
    }

    pub fn push(&mut self, timestamp_ms: i64, id: usize) {
        self.entries.push((timestamp_ms, id));
    }

    pub fn entries(&self) -> &[(i64, usize)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_entries(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|(timestamp, id)| format!("{}-{}", timestamp, id))
            .collect()
    }

    /// Entries joined with commas, including a trailing comma.
    pub fn raw_bytes(&self) -> Vec<u8> {
        let mut raw = self.to_entries().join(",");
        raw.push(',');
        raw.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_author_lines() {
        let author = AuthorData::from_lines(&["0,4095,0,", "", "1,2,3,"]).unwrap();
        assert_eq!(author.row_count(), 2);
        assert_eq!(author.columns(), 3);
        assert_eq!(author.get(0, 1), Some(4095));
        assert_eq!(author.to_lines(), vec!["0,4095,0,", "1,2,3,"]);
        assert_eq!(author.raw_bytes(), b"0,4095,0,\r\n1,2,3,\r\n".to_vec());
    }

    #[test]
    fn test_ragged_author_rejected() {
        let err = AuthorData::from_lines(&["1,2,3,", "1,2,"]).unwrap_err();
        assert!(matches!(
            err,
            CassetteError::RaggedAuthorData {
                row: 2,
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn test_set_reports_previous_value() {
        let mut author = AuthorData::zeroed(2, 5);
        assert_eq!(author.set(1, 4, 100), Some(0));
        assert_eq!(author.set(1, 4, 200), Some(100));
        assert_eq!(author.set(2, 0, 1), None);
        author.push_zero_row();
        assert_eq!(author.row_count(), 3);
    }

    #[test]
    fn test_custom1_entries() {
        let custom1 = Custom1Data::from_entries(&["0-1", "1500-4", ""]).unwrap();
        assert_eq!(custom1.entries(), &[(0, 1), (1500, 4)]);
        assert_eq!(custom1.raw_bytes(), b"0-1,1500-4,".to_vec());
        assert!(Custom1Data::from_entries(&["12"]).is_err());
        assert!(Custom1Data::from_entries(&["1-2-3"]).is_err());
    }
}
