//! Date-partitioned output directory resolution.

use crate::Result;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

/// `base/YYYY/MM` for the given processing date.
pub fn dated_dir(base: &Path, date: NaiveDate) -> PathBuf {
    base.join(date.format("%Y").to_string())
        .join(date.format("%m").to_string())
}

/// Resolve the run's output directory and create it if missing.
///
/// Returns the directory and whether it had to be created.
pub fn ensure_output_dir(base: &Path, date: NaiveDate) -> Result<(PathBuf, bool)> {
    let dir = dated_dir(base, date);
    let created = !dir.is_dir();
    fs::create_dir_all(&dir)?;
    if created {
        tracing::info!("Created output directory: {}", dir.display());
    }
    Ok((dir, created))
}
