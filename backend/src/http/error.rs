//! HTTP error handling and response types.
//!
//! Every error body uses the `{"detail": ...}` envelope: a message string for
//! service errors, a list of field errors for request validation.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::data::SnapshotError;
use crate::models::FieldError;
use crate::reports::ReportError;

/// Prefix of every report generation failure message.
pub const GENERATION_FAILED: &str = "PDF generation failed";

/// API error response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: ErrorDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Fields(Vec<FieldError>),
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Request body failed validation
    Validation(Vec<FieldError>),
    /// A report generator failed or panicked
    Generation(String),
    /// The data table is still being loaded
    DataNotReady,
    /// The data table failed to load
    DataUnavailable(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Generation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::DataNotReady | AppError::DataUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            AppError::Validation(fields) => ErrorDetail::Fields(fields),
            AppError::Generation(msg) => {
                tracing::error!("{}: {}", GENERATION_FAILED, msg);
                ErrorDetail::Message(format!("{}: {}", GENERATION_FAILED, msg))
            }
            AppError::DataNotReady => ErrorDetail::Message(SnapshotError::NotReady.to_string()),
            AppError::DataUnavailable(msg) => {
                ErrorDetail::Message(SnapshotError::Unavailable(msg).to_string())
            }
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}

impl From<SnapshotError> for AppError {
    fn from(err: SnapshotError) -> Self {
        match err {
            SnapshotError::NotReady => AppError::DataNotReady,
            SnapshotError::Unavailable(msg) => AppError::DataUnavailable(msg),
        }
    }
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        AppError::Generation(err.to_string())
    }
}
