//! Removal of stale files from a scratch directory
//!
//! Uploaded and generated lists are kept in a scratch directory only for
//! as long as it takes to hand them back; a periodic sweep deletes the rest.

use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::error::{Result, SyncError};

/// Age after which a file counts as stale
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(120);

/// Delete every regular file in `dir` last modified more than `max_age`
/// ago and return the deleted paths. Subdirectories are left alone.
pub fn sweep<P: AsRef<Path>>(dir: P, max_age: Duration) -> Result<Vec<PathBuf>> {
    sweep_at(dir.as_ref(), max_age, SystemTime::now())
}

fn sweep_at(dir: &Path, max_age: Duration, now: SystemTime) -> Result<Vec<PathBuf>> {
    let cutoff = now.checked_sub(max_age).unwrap_or(SystemTime::UNIX_EPOCH);
    let mut removed = Vec::new();

    for entry in fs::read_dir(dir).map_err(|e| SyncError::io(dir, e))? {
        let entry = entry.map_err(|e| SyncError::io(dir, e))?;
        let path = entry.path();
        let metadata = entry.metadata().map_err(|e| SyncError::io(&path, e))?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified().map_err(|e| SyncError::io(&path, e))?;
        if modified < cutoff {
            fs::remove_file(&path).map_err(|e| SyncError::io(&path, e))?;
            debug!("Removed {}", path.display());
            removed.push(path);
        }
    }

    if !removed.is_empty() {
        info!("Removed {} stale file(s) from {}", removed.len(), dir.display());
    }
    Ok(removed)
}
