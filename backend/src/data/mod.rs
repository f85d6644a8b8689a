//! Astronomical data table: loading, representation and shared access.

pub mod loader;
pub mod store;
pub mod table;

pub use loader::{load, DataFormat, LoadError};
pub use store::{DataStore, LoadState, SnapshotError};
pub use table::DataTable;
