//! Moon parameters report.
//!
//! Lists the data rows for the requested date (and Hijri month/year when the
//! data carries them) together with a min/max/mean summary of every numeric
//! column.

use log::info;
use std::path::PathBuf;
use std::time::Instant;

use super::document::{format_number, ReportDocument, Section};
use super::selection::KeyColumns;
use super::{dataset_footer, output, pdf, report_file_name, ReportError, ReportGenerator};
use crate::data::DataTable;
use crate::models::ReportRequest;

const FILE_PREFIX: &str = "moon_parameters";

/// Summary statistics of one numeric column over the selected rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Summarise every column whose non-empty cells on `rows` are all numeric.
pub fn summarize_columns(table: &DataTable, keys: &KeyColumns, rows: &[usize]) -> Vec<ColumnSummary> {
    let mut summaries = Vec::new();

    'columns: for (col, name) in table.columns().iter().enumerate() {
        if keys.is_key(col) {
            continue;
        }

        let mut values = Vec::new();
        for &row in rows {
            if table.cell(row, col).is_none() {
                continue;
            }
            match table.parse_f64(row, col) {
                Some(v) => values.push(v),
                None => continue 'columns,
            }
        }
        if values.is_empty() {
            continue;
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        summaries.push(ColumnSummary {
            column: name.clone(),
            count: values.len(),
            min,
            max,
            mean,
        });
    }

    summaries
}

/// Build the moon parameters document.
pub fn compute(table: &DataTable, request: &ReportRequest) -> Result<ReportDocument, ReportError> {
    let keys = KeyColumns::resolve(table)?;
    let rows = keys.select(table, request, &[request.date]);
    let month = request.month();

    let mut doc = ReportDocument::new("Moon Parameters")
        .with_subtitle(format!(
            "{} {} AH, observation date {}",
            month,
            request.islamic_year,
            request.date.format("%A %d %B %Y")
        ))
        .with_footer(dataset_footer(table));

    doc.push(Section::new("Request").key_values([
        ("Gregorian date", request.date.format("%Y-%m-%d").to_string()),
        (
            "Islamic month",
            format!("{} ({})", month, request.islamic_month),
        ),
        ("Islamic year", format!("{} AH", request.islamic_year)),
        ("Matching rows", rows.len().to_string()),
    ]));

    if rows.is_empty() {
        doc.push(Section::new("Parameters").paragraph(format!(
            "No moon parameter rows were found for {} ({} {} AH).",
            request.date.format("%Y-%m-%d"),
            month,
            request.islamic_year
        )));
        return Ok(doc);
    }

    let summaries = summarize_columns(table, &keys, &rows);
    if !summaries.is_empty() {
        doc.push(Section::new("Summary").table(
            ["Parameter", "Rows", "Min", "Max", "Mean"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            summaries
                .iter()
                .map(|s| {
                    vec![
                        s.column.clone(),
                        s.count.to_string(),
                        format_number(s.min, 4),
                        format_number(s.max, 4),
                        format_number(s.mean, 4),
                    ]
                })
                .collect(),
        ));
    }

    let shown: Vec<usize> = (0..table.columns().len())
        .filter(|&col| !keys.is_key(col))
        .collect();
    doc.push(Section::new("Parameters").table(
        shown.iter().map(|&col| table.columns()[col].clone()).collect(),
        rows.iter()
            .map(|&row| {
                shown
                    .iter()
                    .map(|&col| table.cell(row, col).unwrap_or("-").to_string())
                    .collect()
            })
            .collect(),
    ));

    Ok(doc)
}

/// Generator behind `POST /generate-moon-parameters/`.
#[derive(Debug, Clone)]
pub struct MoonParametersGenerator {
    output_dir: PathBuf,
}

impl MoonParametersGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

impl ReportGenerator for MoonParametersGenerator {
    fn name(&self) -> &'static str {
        "moon-parameters"
    }

    fn generate(&self, table: &DataTable, request: &ReportRequest) -> Result<PathBuf, ReportError> {
        let started = Instant::now();
        let doc = compute(table, request)?;
        let bytes = pdf::render(&doc);
        let path = output::save_pdf(
            &self.output_dir,
            &report_file_name(FILE_PREFIX, request),
            &bytes,
        )?;
        info!(
            "Moon parameters report for {} written to {} in {:.2?}",
            request.date,
            path.display(),
            started.elapsed()
        );
        Ok(path)
    }
}
