//! Locating request-relevant rows in the data table.
//!
//! The file schema is not fixed, so columns are found by alias. Only the date
//! column is mandatory; Hijri month/year columns narrow the selection when the
//! data carries them.

use chrono::NaiveDate;

use super::ReportError;
use crate::data::DataTable;
use crate::models::ReportRequest;

pub const DATE_COLUMNS: &[&str] = &["date", "gregorian_date", "day"];
pub const MONTH_COLUMNS: &[&str] = &["islamic_month", "hijri_month"];
pub const YEAR_COLUMNS: &[&str] = &["islamic_year", "hijri_year"];
pub const LOCATION_COLUMNS: &[&str] = &["location", "city", "site", "place"];

/// Key columns of a table, resolved once per report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyColumns {
    pub date: Option<usize>,
    pub islamic_month: Option<usize>,
    pub islamic_year: Option<usize>,
    pub location: Option<usize>,
}

impl KeyColumns {
    /// Resolve key columns. A non-empty table without a date column is an error.
    pub fn resolve(table: &DataTable) -> Result<Self, ReportError> {
        let date = table.find_column(DATE_COLUMNS);
        if date.is_none() && !table.is_empty() {
            return Err(ReportError::MissingColumn("date".to_string()));
        }
        Ok(Self {
            date,
            islamic_month: table.find_column(MONTH_COLUMNS),
            islamic_year: table.find_column(YEAR_COLUMNS),
            location: table.find_column(LOCATION_COLUMNS),
        })
    }

    /// Whether `col` is a key column (not a measurement).
    pub fn is_key(&self, col: usize) -> bool {
        [self.date, self.islamic_month, self.islamic_year]
            .contains(&Some(col))
    }

    /// Rows dated on any of `dates` that also match the request's Hijri month/year when present.
    pub fn select(&self, table: &DataTable, request: &ReportRequest, dates: &[NaiveDate]) -> Vec<usize> {
        let Some(date_col) = self.date else {
            return Vec::new();
        };

        table.select(|row| {
            let on_date = table
                .parse_date(row, date_col)
                .is_some_and(|d| dates.contains(&d));
            on_date
                && matches_key(table, row, self.islamic_month, i64::from(request.islamic_month))
                && matches_key(table, row, self.islamic_year, i64::from(request.islamic_year))
        })
    }
}

fn matches_key(table: &DataTable, row: usize, col: Option<usize>, expected: i64) -> bool {
    match col {
        Some(col) => table.parse_i64(row, col) == Some(expected),
        None => true,
    }
}
