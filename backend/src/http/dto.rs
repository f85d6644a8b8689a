//! Data Transfer Objects for the HTTP API.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::{Deserialize, Serialize};

use super::error::AppError;
use crate::data::LoadState;
use crate::models::{FieldError, ReportRequest};

/// Validated report request body.
///
/// Unlike `Json<ReportRequest>`, every invalid field is reported in a single
/// 422 response.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedReport(pub ReportRequest);

impl<S> FromRequest<S> for ValidatedReport
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state).await.map_err(|rejection| {
            AppError::Validation(vec![FieldError::body(
                None,
                rejection.body_text(),
                "body_unreadable",
            )])
        })?;

        ReportRequest::from_json_slice(&body)
            .map(ValidatedReport)
            .map_err(AppError::Validation)
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub data: DataStatus,
}

/// State of the data table as seen by `/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataStatus {
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&LoadState> for DataStatus {
    fn from(state: &LoadState) -> Self {
        let mut status = DataStatus {
            state: state.label().to_string(),
            rows: None,
            columns: None,
            fingerprint: None,
            error: None,
        };
        match state {
            LoadState::Loading => {}
            LoadState::Ready(table) => {
                status.rows = Some(table.len());
                status.columns = Some(table.columns().len());
                status.fingerprint = Some(table.fingerprint().to_string());
            }
            LoadState::Failed(message) => status.error = Some(message.clone()),
        }
        status
    }
}
