//! HTTP server module.
//!
//! An axum server exposing the report generators as a REST API.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  HTTP Layer (axum handlers)                              │
//! │  - Request validation                                    │
//! │  - PDF file responses, static files                      │
//! │  - CORS, compression, error handling                     │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Report Layer (reports/)                                 │
//! │  - Moon parameters, visibility pipeline                  │
//! │  - PDF rendering and output                              │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Data Layer (data/)                                      │
//! │  - DataStore snapshot, loaded once at startup            │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::create_router;
pub use state::AppState;
