//! Moon report HTTP server binary.
//!
//! Loads the settings, starts loading the data directory in the background and
//! serves report requests.
//!
//! # Usage
//!
//! ```bash
//! DATA_DIR=./data cargo run --bin moon-report-server
//! ```
//!
//! # Environment Variables
//!
//! - `MOON_REPORTS_CONFIG`: Path to a TOML settings file (default: `moon-reports.toml` if present)
//! - `HOST`, `PORT`: Bind address (default: 0.0.0.0:8000)
//! - `DATA_DIR`, `OUTPUT_DIR`, `STATIC_DIR`, `INDEX_FILE`, `DATA_READY_TIMEOUT_SECS`
//! - `RUST_LOG`: Log filter (default: info)

use anyhow::Context;
use std::net::SocketAddr;

use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use moon_reports::config::Settings;
use moon_reports::data::DataStore;
use moon_reports::http::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting moon report server");

    let settings = Settings::load().context("Failed to load settings")?;
    info!(
        data_dir = %settings.data_dir.display(),
        output_dir = %settings.output_dir.display(),
        "Settings loaded"
    );

    // Load the data table once, off the request path
    let store = DataStore::new();
    store.spawn_load(settings.data_dir.clone());

    let state = AppState::new(store, &settings);
    let app = create_router(state);

    let addr: SocketAddr = settings
        .bind_address()
        .parse()
        .with_context(|| format!("Invalid bind address {}", settings.bind_address()))?;

    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
