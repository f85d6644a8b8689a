//! Service configuration.
//!
//! Settings are read from an optional TOML file and then overridden by
//! environment variables, so a bare `cargo run` works with the defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "MOON_REPORTS_CONFIG";

/// File looked up in the working directory when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "moon-reports.toml";

/// Errors raised while assembling [`Settings`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime settings for the report service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Interface the HTTP server binds to
    pub host: String,
    /// TCP port of the HTTP server
    pub port: u16,
    /// Directory scanned once at startup for data files
    pub data_dir: PathBuf,
    /// Directory generated PDFs are written to
    pub output_dir: PathBuf,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// HTML document served at `/`
    pub index_file: PathBuf,
    /// How long a report request waits for the data table before giving up
    pub data_ready_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("reports"),
            static_dir: PathBuf::from("static"),
            index_file: PathBuf::from("index.html"),
            data_ready_timeout_secs: 10,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file. Missing keys take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve the full configuration.
    ///
    /// 1. `$MOON_REPORTS_CONFIG` if set (the file must exist)
    /// 2. `moon-reports.toml` in the working directory if present
    /// 3. built-in defaults
    ///
    /// Environment overrides are applied on top in every case.
    pub fn load() -> Result<Self, ConfigError> {
        let base = match env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(PathBuf::from(path))?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };

        base.with_env_overrides()
    }

    /// Apply environment variable overrides.
    ///
    /// # Environment Variables
    /// - `HOST`, `PORT`
    /// - `DATA_DIR`, `OUTPUT_DIR`, `STATIC_DIR`, `INDEX_FILE`
    /// - `DATA_READY_TIMEOUT_SECS`
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(host) = env::var("HOST") {
            self.host = host;
        }
        if let Ok(port) = env::var("PORT") {
            self.port = parse_env("PORT", &port)?;
        }
        if let Some(dir) = env::var_os("DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = env::var_os("OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(dir) = env::var_os("STATIC_DIR") {
            self.static_dir = PathBuf::from(dir);
        }
        if let Some(file) = env::var_os("INDEX_FILE") {
            self.index_file = PathBuf::from(file);
        }
        if let Ok(secs) = env::var("DATA_READY_TIMEOUT_SECS") {
            self.data_ready_timeout_secs = parse_env("DATA_READY_TIMEOUT_SECS", &secs)?;
        }
        Ok(self)
    }

    /// Socket address string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn data_ready_timeout(&self) -> Duration {
        Duration::from_secs(self.data_ready_timeout_secs)
    }
}

fn parse_env<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
