//! Raw table model and value parsing.
//!
//! A [`Table`] is the untyped snapshot every analysis starts from: header
//! names plus rows of string cells, exactly as they came off the CSV reader.
//! Parsing helpers in this module decide what counts as missing, numeric, or
//! a date; higher layers never touch raw cell text directly.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use encoding_rs::Encoding;

use crate::io_utils;

/// Tokens treated as missing values in addition to empty cells.
pub const PLACEHOLDER_TOKENS: &[&str] = &["na", "n/a", "null", "none", "nan"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Returns true when the cell holds no usable value.
pub fn is_missing(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty()
        || PLACEHOLDER_TOKENS
            .iter()
            .any(|token| trimmed.eq_ignore_ascii_case(token))
}

/// Parses a cell as a finite number. `None` means "not numeric", whether the
/// cell is missing, textual, or a non-finite literal like `inf`.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    if is_missing(raw) {
        return None;
    }
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a cell as a calendar date, accepting common date and datetime
/// layouts. Failure is data, not an error: unparseable cells yield `None`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(parsed);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(parsed.date());
        }
    }
    None
}

/// In-memory snapshot of a CSV file: headers plus untyped rows.
#[derive(Debug, Clone)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Builds a table from pre-decoded cells. Ragged rows are padded (or
    /// truncated) to the header width so column indexing is always safe.
    pub fn new(headers: Vec<String>, mut rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        for row in &mut rows {
            row.resize(width, String::new());
        }
        Self { headers, rows }
    }

    /// Reads a whole CSV file into memory, decoding each record with the
    /// supplied encoding.
    pub fn load(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Self> {
        let mut reader = io_utils::open_csv_reader_from_path(path, delimiter, true)?;
        let headers = io_utils::reader_headers(&mut reader, encoding)?;
        let mut rows = Vec::new();
        for (row_idx, record) in reader.byte_records().enumerate() {
            let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
            rows.push(io_utils::decode_record(&record, encoding)?);
        }
        Ok(Self::new(headers, rows))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    /// Iterates the raw cells of one column, top to bottom.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .map(move |row| row.get(index).map(String::as_str).unwrap_or(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_detection_covers_placeholders() {
        assert!(is_missing(""));
        assert!(is_missing("   "));
        assert!(is_missing("NA"));
        assert!(is_missing("n/a"));
        assert!(is_missing("NULL"));
        assert!(!is_missing("0"));
        assert!(!is_missing("north"));
    }

    #[test]
    fn numeric_parse_rejects_non_finite() {
        assert_eq!(parse_numeric("12.5"), Some(12.5));
        assert_eq!(parse_numeric(" -3 "), Some(-3.0));
        assert_eq!(parse_numeric("inf"), None);
        assert_eq!(parse_numeric("twelve"), None);
        assert_eq!(parse_numeric("nan"), None);
    }

    #[test]
    fn date_parse_accepts_common_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 30).unwrap();
        assert_eq!(parse_date("2024-01-30"), Some(expected));
        assert_eq!(parse_date("30/01/2024"), Some(expected));
        assert_eq!(parse_date("2024-01-30 08:15:00"), Some(expected));
        assert_eq!(parse_date("not a date"), None);
    }

    #[test]
    fn ragged_rows_are_padded() {
        let table = Table::new(
            vec!["a".into(), "b".into(), "c".into()],
            vec![vec!["1".into()], vec!["1".into(), "2".into(), "3".into(), "4".into()]],
        );
        assert!(table.rows().iter().all(|row| row.len() == 3));
    }
}
