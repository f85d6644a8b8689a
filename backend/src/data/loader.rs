//! Loading of the astronomical data directory.
//!
//! Every `.csv` / `.tsv` file below the data directory is read and stacked into
//! a single [`DataTable`]. Files are visited in sorted path order so the row
//! order, and therefore every report, is reproducible.

use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use super::table::DataTable;

/// Errors raised while reading the data directory.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Data directory {path} is not readable: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read data file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Csv,
    Tsv,
}

impl DataFormat {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(Self::Csv),
            "tsv" => Some(Self::Tsv),
            _ => None,
        }
    }

    fn delimiter(self) -> u8 {
        match self {
            Self::Csv => b',',
            Self::Tsv => b'\t',
        }
    }
}

/// Load every supported file under `path` into one table.
pub fn load(path: &Path) -> Result<DataTable, LoadError> {
    let files = discover_files(path)?;
    if files.is_empty() {
        warn!("No data files found under {}", path.display());
    }

    let mut table = DataTable::default();
    for (file, format) in files {
        let part = load_file(&file, format)?;
        debug!(
            "Loaded {} rows x {} columns from {}",
            part.len(),
            part.columns().len(),
            file.display()
        );
        table.append(part);
    }

    info!(
        "Data table ready: {} rows, {} columns from {}",
        table.len(),
        table.columns().len(),
        path.display()
    );
    Ok(table)
}

/// Read a single delimited file. The first record is the header.
pub fn load_file(path: &Path, format: DataFormat) -> Result<DataTable, LoadError> {
    let file_error = |source| LoadError::File {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(format.delimiter())
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(file_error)?;

    let columns: Vec<String> = reader
        .headers()
        .map_err(file_error)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut table = DataTable::new(columns);
    for record in reader.records() {
        let record = record.map_err(file_error)?;
        // Blank lines in hand-edited files come through as one empty field
        if record.iter().all(str::is_empty) {
            continue;
        }
        table.push_row(record.iter().map(str::to_string).collect());
    }
    Ok(table)
}

/// Collect supported files below `root`, sorted by path.
fn discover_files(root: &Path) -> Result<Vec<(PathBuf, DataFormat)>, LoadError> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = fs::read_dir(&dir).map_err(|source| LoadError::Directory {
            path: dir.clone(),
            source,
        })?;

        for entry in entries {
            let entry = entry.map_err(|source| LoadError::Directory {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(|source| LoadError::Directory {
                path: path.clone(),
                source,
            })?;
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_symlink() && path.is_dir() {
                // Directory links are never followed
                warn!("Skipping symlinked directory {}", path.display());
            } else if let Some(format) = DataFormat::from_path(&path) {
                found.push((path, format));
            } else {
                debug!("Skipping unsupported file {}", path.display());
            }
        }
    }

    found.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(found)
}
