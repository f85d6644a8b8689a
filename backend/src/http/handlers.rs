//! HTTP handlers for the REST API.
//!
//! Report handlers take a snapshot of the data table, run the generator on the
//! blocking pool and stream the resulting PDF back as an attachment.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use std::path::Path;
use std::sync::Arc;

use super::dto::{DataStatus, HealthResponse, ValidatedReport};
use super::error::AppError;
use super::state::AppState;
use crate::models::ReportRequest;
use crate::reports::ReportGenerator;

const PDF_CONTENT_TYPE: &str = "application/pdf";

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Service liveness plus the state of the data table.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let load_state = state.store.state();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        data: DataStatus::from(&load_state),
    })
}

// =============================================================================
// Reports
// =============================================================================

/// POST /generate-moon-parameters/
pub async fn generate_moon_parameters(
    State(state): State<AppState>,
    ValidatedReport(request): ValidatedReport,
) -> Result<Response, AppError> {
    let generator = Arc::clone(&state.moon_parameters);
    generate_report(&state, generator, request).await
}

/// POST /generate-visibility-report/
pub async fn generate_visibility_report(
    State(state): State<AppState>,
    ValidatedReport(request): ValidatedReport,
) -> Result<Response, AppError> {
    let generator = Arc::clone(&state.visibility);
    generate_report(&state, generator, request).await
}

async fn generate_report(
    state: &AppState,
    generator: Arc<dyn ReportGenerator>,
    request: ReportRequest,
) -> Result<Response, AppError> {
    let table = state.store.snapshot(state.data_ready_timeout).await?;
    tracing::info!(
        report = generator.name(),
        date = %request.date,
        islamic_month = request.islamic_month,
        islamic_year = request.islamic_year,
        rows = table.len(),
        "Generating report"
    );

    let path = tokio::task::spawn_blocking(move || generator.generate(&table, &request))
        .await
        .map_err(|e| AppError::Generation(format!("Task join error: {}", e)))??;

    pdf_response(&path).await
}

/// Read a generated PDF and wrap it as a file download.
async fn pdf_response(path: &Path) -> Result<Response, AppError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        AppError::Generation(format!("Failed to read {}: {}", path.display(), e))
    })?;

    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("report.pdf");

    Ok((
        [
            (header::CONTENT_TYPE, PDF_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response())
}
