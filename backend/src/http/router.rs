//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    routing::{get, get_service, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // Any origin, method and header, with credentials
    let cors = CorsLayer::very_permissive();

    let index = ServeFile::new(&state.index_file);
    let assets = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/", get_service(index))
        .route("/health", get(handlers::health_check))
        .route(
            "/generate-moon-parameters/",
            post(handlers::generate_moon_parameters),
        )
        .route(
            "/generate-visibility-report/",
            post(handlers::generate_visibility_report),
        )
        .nest_service("/static", assets)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
