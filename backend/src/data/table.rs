//! In-memory table assembled from the astronomical data files.

use chrono::{NaiveDate, NaiveDateTime};
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

/// Date layouts accepted in date-like columns.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];

/// Datetime layouts whose date part is used when a plain date does not parse.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Rows of string cells under named columns.
///
/// Cells are kept as the text found in the source files. Empty cells stand for
/// missing values and are skipped by the typed accessors.
#[derive(Debug, Clone, Default)]
pub struct DataTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    fingerprint: OnceLock<String>,
}

impl DataTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            fingerprint: OnceLock::new(),
        }
    }

    /// Build a table from columns and rows, padding or truncating rows to the column count.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub(crate) fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
        self.fingerprint = OnceLock::new();
    }

    /// Append `other` below this table. Columns are unioned in first-seen order.
    pub fn append(&mut self, other: DataTable) {
        self.fingerprint = OnceLock::new();
        let mapping: Vec<usize> = other
            .columns
            .into_iter()
            .map(|name| match self.exact_index(&name) {
                Some(idx) => idx,
                None => {
                    self.columns.push(name);
                    self.columns.len() - 1
                }
            })
            .collect();

        let width = self.columns.len();
        for row in &mut self.rows {
            row.resize(width, String::new());
        }

        for row in other.rows {
            let mut aligned = vec![String::new(); width];
            for (cell, &target) in row.into_iter().zip(&mapping) {
                aligned[target] = cell;
            }
            self.rows.push(aligned);
        }
    }

    fn exact_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Case-insensitive column lookup.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }

    /// First column matching any of `aliases`, in alias order.
    pub fn find_column(&self, aliases: &[&str]) -> Option<usize> {
        aliases.iter().find_map(|alias| self.column_index(alias))
    }

    /// Raw cell text; `None` when the row or column is out of range or the cell is empty.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn parse_f64(&self, row: usize, col: usize) -> Option<f64> {
        self.cell(row, col)
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }

    pub fn parse_i64(&self, row: usize, col: usize) -> Option<i64> {
        let text = self.cell(row, col)?;
        text.parse::<i64>().ok().or_else(|| {
            // Integers written by spreadsheet exports often carry a ".0"
            text.parse::<f64>()
                .ok()
                .filter(|v| v.fract() == 0.0 && v.abs() < i64::MAX as f64)
                .map(|v| v as i64)
        })
    }

    pub fn parse_date(&self, row: usize, col: usize) -> Option<NaiveDate> {
        self.cell(row, col).and_then(parse_date_text)
    }

    /// Indices of rows matching `predicate`, in table order.
    pub fn select<F>(&self, mut predicate: F) -> Vec<usize>
    where
        F: FnMut(usize) -> bool,
    {
        (0..self.rows.len()).filter(|&i| predicate(i)).collect()
    }

    /// SHA-256 over column names and cells, hex encoded.
    ///
    /// Two tables with the same columns and rows in the same order share a fingerprint.
    /// Computed on first use and cached.
    pub fn fingerprint(&self) -> &str {
        self.fingerprint.get_or_init(|| self.compute_fingerprint())
    }

    fn compute_fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for name in &self.columns {
            hasher.update(name.as_bytes());
            hasher.update([0x1f]);
        }
        hasher.update([0x1e]);
        for row in &self.rows {
            for cell in row {
                hasher.update(cell.as_bytes());
                hasher.update([0x1f]);
            }
            hasher.update([0x1e]);
        }
        hex::encode(hasher.finalize())
    }
}

impl PartialEq for DataTable {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns && self.rows == other.rows
    }
}

/// Parse the date part of a cell, trying plain dates then datetimes.
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> DataTable {
        DataTable::from_rows(
            strings(&["Date", "City", "moon_altitude"]),
            vec![
                strings(&["2024-03-10", "Mecca", "5.2"]),
                strings(&["2024-03-11", "Mecca", ""]),
                strings(&["10/03/2024", "Cairo"]),
            ],
        )
    }

    #[test]
    fn test_rows_are_padded_to_width() {
        let table = sample();
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows()[2].len(), 3);
        assert_eq!(table.cell(2, 2), None);
    }

    #[test]
    fn test_column_lookup_is_case_insensitive() {
        let table = sample();
        assert_eq!(table.column_index("date"), Some(0));
        assert_eq!(table.find_column(&["gregorian_date", "DATE"]), Some(0));
        assert_eq!(table.find_column(&["arcv"]), None);
    }

    #[test]
    fn test_typed_accessors() {
        let table = sample();
        assert_eq!(table.parse_f64(0, 2), Some(5.2));
        assert_eq!(table.parse_f64(1, 2), None);
        assert_eq!(table.parse_f64(0, 1), None);

        let expected = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(table.parse_date(0, 0), Some(expected));
        assert_eq!(table.parse_date(2, 0), Some(expected));
    }

    #[test]
    fn test_parse_i64_accepts_integral_floats() {
        let table = DataTable::from_rows(
            strings(&["hijri_month"]),
            vec![strings(&["9"]), strings(&["9.0"]), strings(&["9.5"])],
        );
        assert_eq!(table.parse_i64(0, 0), Some(9));
        assert_eq!(table.parse_i64(1, 0), Some(9));
        assert_eq!(table.parse_i64(2, 0), None);
    }

    #[test]
    fn test_parse_datetime_cells() {
        assert_eq!(
            parse_date_text("2024-03-10 18:45:00"),
            NaiveDate::from_ymd_opt(2024, 3, 10)
        );
        assert_eq!(parse_date_text("yesterday"), None);
    }

    #[test]
    fn test_append_unions_columns() {
        let mut table = DataTable::from_rows(
            strings(&["date", "elongation"]),
            vec![strings(&["2024-03-10", "9.8"])],
        );
        let other = DataTable::from_rows(
            strings(&["arcv", "date"]),
            vec![strings(&["4.1", "2024-03-11"])],
        );

        table.append(other);

        assert_eq!(table.columns(), &strings(&["date", "elongation", "arcv"])[..]);
        assert_eq!(table.rows()[0], strings(&["2024-03-10", "9.8", ""]));
        assert_eq!(table.rows()[1], strings(&["2024-03-11", "", "4.1"]));
    }

    #[test]
    fn test_select() {
        let table = sample();
        let mecca = table.select(|i| table.cell(i, 1) == Some("Mecca"));
        assert_eq!(mecca, vec![0, 1]);
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = sample();
        let b = sample();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);

        let mut c = sample();
        c.push_row(strings(&["2024-03-12", "Rabat", "1.0"]));
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}
