//! # Moon Reports Backend
//!
//! HTTP service producing PDF reports on the Moon for the start of Islamic
//! (Hijri) months.
//!
//! Tabular astronomical data files are loaded once at startup into a shared,
//! read-only table. Each report request selects the rows relevant to a
//! Gregorian date and Hijri month/year and renders them to a PDF file.
//!
//! ## Architecture
//!
//! - [`config`]: settings from TOML and environment variables
//! - [`data`]: the data table, its loader and the shared store
//! - [`models`]: request parameters and Hijri months
//! - [`reports`]: moon parameters and crescent visibility reports, PDF output
//! - [`http`]: Axum-based HTTP server and request handlers

pub mod config;
pub mod data;
pub mod models;
pub mod reports;

#[cfg(feature = "http-server")]
pub mod http;
