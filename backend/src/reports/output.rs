//! Writing rendered reports to the output directory.

use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

use super::ReportError;

/// Write `bytes` to `dir/file_name` and return the final path.
///
/// The file is first written under a unique temporary name in the same
/// directory and then renamed, so readers never see a partial PDF even when
/// identical requests race.
pub fn save_pdf(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ReportError> {
    fs::create_dir_all(dir).map_err(|source| ReportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let target = dir.join(file_name);
    let staging = dir.join(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

    fs::write(&staging, bytes).map_err(|source| ReportError::Io {
        path: staging.clone(),
        source,
    })?;

    if let Err(source) = fs::rename(&staging, &target) {
        let _ = fs::remove_file(&staging);
        return Err(ReportError::Io {
            path: target,
            source,
        });
    }

    debug!("Wrote {} bytes to {}", bytes.len(), target.display());
    Ok(target)
}
