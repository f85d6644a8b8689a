//! Crescent visibility report.
//!
//! Rows for the requested evening and the following one are assessed with
//! Yallop's q-test (NAO Technical Note 69):
//!
//! ```text
//! q = (ARCV - (11.8371 - 6.3226 W + 0.7319 W^2 - 0.1018 W^3)) / 10
//! ```
//!
//! where ARCV is the arc of vision in degrees and W the topocentric crescent
//! width in arcminutes. The report is assembled by [`VisibilityPipeline`], a
//! fixed sequence of stages run by [`VisibilityPipeline::run_all`].

use chrono::{Days, NaiveDate};
use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

use super::document::{format_number, ReportDocument, Section};
use super::selection::KeyColumns;
use super::{dataset_footer, output, pdf, report_file_name, ReportError, ReportGenerator};
use crate::data::DataTable;
use crate::models::ReportRequest;

const FILE_PREFIX: &str = "visibility_report";

const ARCV_COLUMNS: &[&str] = &["arcv", "arc_of_vision"];
const MOON_ALTITUDE_COLUMNS: &[&str] = &["moon_altitude", "moon_alt"];
const SUN_ALTITUDE_COLUMNS: &[&str] = &["sun_altitude", "sun_alt"];
const WIDTH_COLUMNS: &[&str] = &["w", "crescent_width", "width"];
const ELONGATION_COLUMNS: &[&str] = &["elongation", "arcl"];

/// Mean topocentric lunar semi-diameter, arcminutes.
pub const MEAN_LUNAR_SEMIDIAMETER_ARCMIN: f64 = 15.5;

/// Yallop visibility classes, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum VisibilityCategory {
    A,
    B,
    C,
    D,
    E,
    F,
    Unknown,
}

impl VisibilityCategory {
    pub const ALL: [VisibilityCategory; 7] = [
        VisibilityCategory::A,
        VisibilityCategory::B,
        VisibilityCategory::C,
        VisibilityCategory::D,
        VisibilityCategory::E,
        VisibilityCategory::F,
        VisibilityCategory::Unknown,
    ];

    pub fn from_q(q: f64) -> Self {
        if q > 0.216 {
            VisibilityCategory::A
        } else if q > -0.014 {
            VisibilityCategory::B
        } else if q > -0.160 {
            VisibilityCategory::C
        } else if q > -0.232 {
            VisibilityCategory::D
        } else if q > -0.293 {
            VisibilityCategory::E
        } else {
            VisibilityCategory::F
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            VisibilityCategory::A => "Easily visible to the naked eye",
            VisibilityCategory::B => "Visible under perfect conditions",
            VisibilityCategory::C => "May need optical aid to find the crescent",
            VisibilityCategory::D => "Will need optical aid to find the crescent",
            VisibilityCategory::E => "Not visible with a telescope",
            VisibilityCategory::F => "Not visible, below the Danjon limit",
            VisibilityCategory::Unknown => "Insufficient data",
        }
    }
}

impl fmt::Display for VisibilityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisibilityCategory::Unknown => f.write_str("?"),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Yallop's q value.
pub fn yallop_q(arcv: f64, width: f64) -> f64 {
    let w = width;
    (arcv - (11.8371 - 6.3226 * w + 0.7319 * w.powi(2) - 0.1018 * w.powi(3))) / 10.0
}

/// Crescent width in arcminutes from elongation in degrees.
pub fn crescent_width(elongation_deg: f64) -> f64 {
    MEAN_LUNAR_SEMIDIAMETER_ARCMIN * (1.0 - elongation_deg.to_radians().cos())
}

/// Visibility assessment of a single data row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrescentAssessment {
    pub row: usize,
    pub date: NaiveDate,
    pub location: Option<String>,
    pub arcv: Option<f64>,
    pub width: Option<f64>,
    pub q: Option<f64>,
    pub category: VisibilityCategory,
}

/// Aggregates over all assessments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibilitySummary {
    pub counts: BTreeMap<VisibilityCategory, usize>,
    /// Index into the assessments of the highest q per evening
    pub best_per_day: BTreeMap<NaiveDate, usize>,
}

/// Named pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    SelectRows,
    ComputeCriteria,
    Summarize,
    Render,
    Save,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::SelectRows,
        Stage::ComputeCriteria,
        Stage::Summarize,
        Stage::Render,
        Stage::Save,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::SelectRows => "select_rows",
            Stage::ComputeCriteria => "compute_criteria",
            Stage::Summarize => "summarize",
            Stage::Render => "render",
            Stage::Save => "save",
        }
    }
}

/// Staged builder of the visibility report.
///
/// Each stage stores its output on the pipeline; a stage run before the one it
/// depends on fails with [`ReportError::Pipeline`].
pub struct VisibilityPipeline<'a> {
    table: &'a DataTable,
    request: ReportRequest,
    output_dir: PathBuf,
    keys: Option<KeyColumns>,
    rows: Option<Vec<usize>>,
    assessments: Option<Vec<CrescentAssessment>>,
    summary: Option<VisibilitySummary>,
    rendered: Option<Vec<u8>>,
    path: Option<PathBuf>,
}

fn missing(stage: Stage, requires: Stage) -> ReportError {
    ReportError::Pipeline {
        stage: stage.name(),
        requires: requires.name(),
    }
}

impl<'a> VisibilityPipeline<'a> {
    pub fn new(table: &'a DataTable, request: ReportRequest, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            table,
            request,
            output_dir: output_dir.into(),
            keys: None,
            rows: None,
            assessments: None,
            summary: None,
            rendered: None,
            path: None,
        }
    }

    /// The two evenings covered by the report.
    pub fn evenings(&self) -> [NaiveDate; 2] {
        let next = self
            .request
            .date
            .checked_add_days(Days::new(1))
            .unwrap_or(self.request.date);
        [self.request.date, next]
    }

    pub fn assessments(&self) -> Option<&[CrescentAssessment]> {
        self.assessments.as_deref()
    }

    pub fn summary(&self) -> Option<&VisibilitySummary> {
        self.summary.as_ref()
    }

    pub fn rendered(&self) -> Option<&[u8]> {
        self.rendered.as_deref()
    }

    pub fn run_stage(&mut self, stage: Stage) -> Result<(), ReportError> {
        let started = Instant::now();
        match stage {
            Stage::SelectRows => self.select_rows()?,
            Stage::ComputeCriteria => self.compute_criteria()?,
            Stage::Summarize => self.summarize()?,
            Stage::Render => self.render()?,
            Stage::Save => self.save()?,
        }
        debug!(
            "Visibility stage {} finished in {:.2?}",
            stage.name(),
            started.elapsed()
        );
        Ok(())
    }

    /// Run every stage in order and return the saved report path.
    pub fn run_all(mut self) -> Result<PathBuf, ReportError> {
        for stage in Stage::ALL {
            self.run_stage(stage)?;
        }
        self.path.ok_or_else(|| missing(Stage::Save, Stage::Render))
    }

    pub fn select_rows(&mut self) -> Result<(), ReportError> {
        let keys = KeyColumns::resolve(self.table)?;
        let rows = keys.select(self.table, &self.request, &self.evenings());
        self.keys = Some(keys);
        self.rows = Some(rows);
        Ok(())
    }

    pub fn compute_criteria(&mut self) -> Result<(), ReportError> {
        let (Some(keys), Some(rows)) = (self.keys, self.rows.as_ref()) else {
            return Err(missing(Stage::ComputeCriteria, Stage::SelectRows));
        };
        let table = self.table;

        let arcv_col = table.find_column(ARCV_COLUMNS);
        let moon_alt_col = table.find_column(MOON_ALTITUDE_COLUMNS);
        let sun_alt_col = table.find_column(SUN_ALTITUDE_COLUMNS);
        let width_col = table.find_column(WIDTH_COLUMNS);
        let elongation_col = table.find_column(ELONGATION_COLUMNS);

        let value = |row: usize, col: Option<usize>| col.and_then(|c| table.parse_f64(row, c));

        let mut assessments = Vec::with_capacity(rows.len());
        for &row in rows {
            // `select` only yields rows whose date parsed
            let Some(date) = keys.date.and_then(|c| table.parse_date(row, c)) else {
                continue;
            };

            let arcv = value(row, arcv_col).or_else(|| {
                Some(value(row, moon_alt_col)? - value(row, sun_alt_col)?)
            });
            let width = value(row, width_col)
                .or_else(|| value(row, elongation_col).map(crescent_width));
            let q = match (arcv, width) {
                (Some(arcv), Some(width)) => Some(yallop_q(arcv, width)),
                _ => None,
            };

            assessments.push(CrescentAssessment {
                row,
                date,
                location: keys
                    .location
                    .and_then(|c| table.cell(row, c))
                    .map(str::to_string),
                arcv,
                width,
                q,
                category: q.map_or(VisibilityCategory::Unknown, VisibilityCategory::from_q),
            });
        }

        self.assessments = Some(assessments);
        Ok(())
    }

    pub fn summarize(&mut self) -> Result<(), ReportError> {
        let assessments = self
            .assessments
            .as_ref()
            .ok_or_else(|| missing(Stage::Summarize, Stage::ComputeCriteria))?;

        let mut summary = VisibilitySummary::default();
        for (idx, a) in assessments.iter().enumerate() {
            *summary.counts.entry(a.category).or_insert(0) += 1;

            let Some(q) = a.q else { continue };
            let best = summary.best_per_day.entry(a.date).or_insert(idx);
            if assessments[*best].q.map_or(true, |best_q| q > best_q) {
                *best = idx;
            }
        }

        self.summary = Some(summary);
        Ok(())
    }

    pub fn render(&mut self) -> Result<(), ReportError> {
        let (Some(assessments), Some(summary)) = (self.assessments.as_ref(), self.summary.as_ref())
        else {
            return Err(missing(Stage::Render, Stage::Summarize));
        };

        let doc = build_document(self.table, &self.request, self.evenings(), assessments, summary);
        self.rendered = Some(pdf::render(&doc));
        Ok(())
    }

    pub fn save(&mut self) -> Result<(), ReportError> {
        let bytes = self
            .rendered
            .as_ref()
            .ok_or_else(|| missing(Stage::Save, Stage::Render))?;

        let path = output::save_pdf(
            &self.output_dir,
            &report_file_name(FILE_PREFIX, &self.request),
            bytes,
        )?;
        self.path = Some(path);
        Ok(())
    }
}

fn format_opt(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format_number(v, decimals))
}

fn build_document(
    table: &DataTable,
    request: &ReportRequest,
    evenings: [NaiveDate; 2],
    assessments: &[CrescentAssessment],
    summary: &VisibilitySummary,
) -> ReportDocument {
    let month = request.month();
    let mut doc = ReportDocument::new("Crescent Visibility Report")
        .with_subtitle(format!(
            "Start of {} {} AH, evenings of {} and {}",
            month,
            request.islamic_year,
            evenings[0].format("%Y-%m-%d"),
            evenings[1].format("%Y-%m-%d")
        ))
        .with_footer(dataset_footer(table));

    doc.push(
        Section::new("Criterion")
            .paragraph(
                "Visibility is assessed with the Yallop q-test, \
                 q = (ARCV - (11.8371 - 6.3226 W + 0.7319 W^2 - 0.1018 W^3)) / 10, \
                 where ARCV is the arc of vision in degrees and W the crescent width in arcminutes.",
            )
            .key_values(
                VisibilityCategory::ALL
                    .iter()
                    .filter(|c| **c != VisibilityCategory::Unknown)
                    .map(|c| (format!("Class {}", c), c.description().to_string())),
            ),
    );

    doc.push(
        Section::new("Summary").key_values(
            VisibilityCategory::ALL
                .iter()
                .map(|c| {
                    let count = summary.counts.get(c).copied().unwrap_or(0);
                    (format!("{} ({})", c, c.description()), count.to_string())
                }),
        ),
    );

    let best = if summary.best_per_day.is_empty() {
        Section::new("Best prospects").paragraph(
            "No row carried enough data (ARCV and crescent width) to assess visibility.",
        )
    } else {
        Section::new("Best prospects").key_values(summary.best_per_day.iter().map(|(date, &idx)| {
            let a = &assessments[idx];
            let place = a.location.as_deref().unwrap_or("unnamed site");
            (
                date.format("%Y-%m-%d").to_string(),
                format!(
                    "q = {} (class {}) at {}",
                    format_opt(a.q, 3),
                    a.category,
                    place
                ),
            )
        }))
    };
    doc.push(best);

    if assessments.is_empty() {
        doc.push(Section::new("Assessments").paragraph(format!(
            "No data rows were found for {} {} AH on the evenings of {} and {}.",
            month,
            request.islamic_year,
            evenings[0].format("%Y-%m-%d"),
            evenings[1].format("%Y-%m-%d")
        )));
    } else {
        doc.push(Section::new("Assessments").table(
            ["Date", "Location", "ARCV (deg)", "W (arcmin)", "q", "Class"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            assessments
                .iter()
                .map(|a| {
                    vec![
                        a.date.format("%Y-%m-%d").to_string(),
                        a.location.clone().unwrap_or_else(|| "-".to_string()),
                        format_opt(a.arcv, 2),
                        format_opt(a.width, 3),
                        format_opt(a.q, 3),
                        a.category.to_string(),
                    ]
                })
                .collect(),
        ));
    }

    doc
}

/// Generator behind `POST /generate-visibility-report/`.
#[derive(Debug, Clone)]
pub struct VisibilityReportGenerator {
    output_dir: PathBuf,
}

impl VisibilityReportGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

impl ReportGenerator for VisibilityReportGenerator {
    fn name(&self) -> &'static str {
        "visibility-report"
    }

    fn generate(&self, table: &DataTable, request: &ReportRequest) -> Result<PathBuf, ReportError> {
        let started = Instant::now();
        let path = VisibilityPipeline::new(table, *request, &self.output_dir).run_all()?;
        info!(
            "Visibility report for {} written to {} in {:.2?}",
            request.date,
            path.display(),
            started.elapsed()
        );
        Ok(path)
    }
}
