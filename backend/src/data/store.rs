//! Process-wide handle on the loaded data table.
//!
//! The table is published exactly once by the startup loader. Readers take an
//! `Arc` snapshot of the current state and never hold a lock while generating
//! reports. A request that arrives before loading finishes waits up to a bounded
//! timeout and is then told explicitly that the data is not ready.

use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::loader;
use super::table::DataTable;

/// Lifecycle of the shared table.
#[derive(Debug, Clone)]
pub enum LoadState {
    Loading,
    Ready(Arc<DataTable>),
    Failed(String),
}

impl LoadState {
    pub fn label(&self) -> &'static str {
        match self {
            LoadState::Loading => "loading",
            LoadState::Ready(_) => "ready",
            LoadState::Failed(_) => "failed",
        }
    }

    fn is_settled(&self) -> bool {
        !matches!(self, LoadState::Loading)
    }
}

/// Why a snapshot could not be handed out.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("Data table is still loading")]
    NotReady,

    #[error("Data table unavailable: {0}")]
    Unavailable(String),
}

/// Shared, cloneable handle on the data table.
#[derive(Clone)]
pub struct DataStore {
    tx: Arc<watch::Sender<LoadState>>,
}

impl DataStore {
    /// A store with no table yet.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(LoadState::Loading);
        Self { tx: Arc::new(tx) }
    }

    /// A store that is already ready with `table`.
    pub fn with_table(table: DataTable) -> Self {
        let store = Self::new();
        store.publish(Ok(table));
        store
    }

    /// Current state without waiting.
    pub fn state(&self) -> LoadState {
        self.tx.borrow().clone()
    }

    /// Record the outcome of a load. Only the first outcome is kept.
    pub fn publish(&self, outcome: Result<DataTable, String>) -> bool {
        self.tx.send_if_modified(|state| {
            if state.is_settled() {
                return false;
            }
            *state = match outcome {
                Ok(table) => LoadState::Ready(Arc::new(table)),
                Err(message) => LoadState::Failed(message),
            };
            true
        })
    }

    /// Load `data_dir` on a dedicated blocking worker and publish the result.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn_load(&self, data_dir: PathBuf) -> JoinHandle<()> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || {
            let started = Instant::now();
            info!("Loading data files from {}", data_dir.display());
            match loader::load(&data_dir) {
                Ok(table) => {
                    info!(
                        "Loaded {} rows in {:.2?} (fingerprint {})",
                        table.len(),
                        started.elapsed(),
                        &table.fingerprint()[..12]
                    );
                    store.publish(Ok(table));
                }
                Err(e) => {
                    error!("Data loading failed: {}", e);
                    store.publish(Err(e.to_string()));
                }
            }
        })
    }

    /// Snapshot of the table, waiting at most `timeout` for loading to settle.
    pub async fn snapshot(&self, timeout: Duration) -> Result<Arc<DataTable>, SnapshotError> {
        let mut rx = self.tx.subscribe();
        let settled = tokio::time::timeout(timeout, rx.wait_for(LoadState::is_settled)).await;

        let state = match settled {
            Ok(Ok(state)) => state.clone(),
            // The sender lives in `self`, so the channel cannot close while we wait
            Ok(Err(_)) | Err(_) => self.state(),
        };

        match state {
            LoadState::Ready(table) => Ok(table),
            LoadState::Failed(message) => Err(SnapshotError::Unavailable(message)),
            LoadState::Loading => Err(SnapshotError::NotReady),
        }
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}
