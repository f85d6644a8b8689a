//! PDF report generation.
//!
//! A generator maps the loaded [`DataTable`] and a [`ReportRequest`] to a PDF
//! file on disk. Two generators exist:
//!
//! - [`MoonParametersGenerator`]: the rows for the requested date with a numeric summary
//! - [`VisibilityReportGenerator`]: crescent visibility (Yallop q-test) over the
//!   requested evening and the next, built by a staged [`VisibilityPipeline`]
//!
//! Both go through the same document model ([`document`]), renderer ([`pdf`])
//! and file output ([`output`]).

use std::path::PathBuf;

use crate::data::DataTable;
use crate::models::ReportRequest;

pub mod document;
pub mod moon_parameters;
pub mod output;
pub mod pdf;
pub mod selection;
pub mod visibility;

pub use document::{Block, ReportDocument, Section, TableBlock};
pub use moon_parameters::MoonParametersGenerator;
pub use visibility::{VisibilityCategory, VisibilityPipeline, VisibilityReportGenerator};

/// Errors raised while computing, rendering or saving a report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Data table has no {0} column")]
    MissingColumn(String),

    #[error("Stage '{stage}' requires '{requires}' to run first")]
    Pipeline {
        stage: &'static str,
        requires: &'static str,
    },

    #[error("Failed to write report {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(String),
}

/// Produces a PDF report file for a request.
///
/// Implementations must be pure functions of `(table, request)`: the same
/// inputs render byte-identical files.
pub trait ReportGenerator: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Generate the report and return the path of the written PDF.
    fn generate(&self, table: &DataTable, request: &ReportRequest) -> Result<PathBuf, ReportError>;
}

/// Name of the file a report kind writes for `request`.
pub(crate) fn report_file_name(prefix: &str, request: &ReportRequest) -> String {
    format!("{}_{}.pdf", prefix, request.file_stem())
}

/// Footer line identifying the data a report was computed from.
pub(crate) fn dataset_footer(table: &DataTable) -> String {
    if table.is_empty() {
        return "Dataset: empty".to_string();
    }
    format!(
        "Dataset {} ({} rows)",
        &table.fingerprint()[..12],
        table.len()
    )
}
