//! Application state for the HTTP server.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Settings;
use crate::data::DataStore;
use crate::reports::{MoonParametersGenerator, ReportGenerator, VisibilityReportGenerator};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Handle on the data table loaded at startup
    pub store: DataStore,
    /// Generator behind `/generate-moon-parameters/`
    pub moon_parameters: Arc<dyn ReportGenerator>,
    /// Generator behind `/generate-visibility-report/`
    pub visibility: Arc<dyn ReportGenerator>,
    /// Upper bound on how long a request waits for the data table
    pub data_ready_timeout: Duration,
    pub static_dir: PathBuf,
    pub index_file: PathBuf,
}

impl AppState {
    /// Create the application state with the built-in generators.
    pub fn new(store: DataStore, settings: &Settings) -> Self {
        Self {
            store,
            moon_parameters: Arc::new(MoonParametersGenerator::new(&settings.output_dir)),
            visibility: Arc::new(VisibilityReportGenerator::new(&settings.output_dir)),
            data_ready_timeout: settings.data_ready_timeout(),
            static_dir: settings.static_dir.clone(),
            index_file: settings.index_file.clone(),
        }
    }

    /// Replace the report generators.
    pub fn with_generators(
        mut self,
        moon_parameters: Arc<dyn ReportGenerator>,
        visibility: Arc<dyn ReportGenerator>,
    ) -> Self {
        self.moon_parameters = moon_parameters;
        self.visibility = visibility;
        self
    }
}
