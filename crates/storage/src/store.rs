//! Load, save and prune the state file.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use slotwatch_core::PersistedState;
use tracing::{debug, warn};

use crate::error::StorageError;

/// Read every record from `path`.
///
/// Returns an empty list when the file is missing, empty, or fails to
/// parse. Records written before newer optional fields existed load with
/// those fields defaulted. If the same id appears twice the later record
/// wins.
pub fn load(path: &Path) -> Vec<PersistedState> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no state file yet, starting empty");
            return Vec::new();
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read state file, starting empty");
            return Vec::new();
        }
    };

    if content.trim().is_empty() {
        return Vec::new();
    }

    match serde_json::from_str::<Vec<PersistedState>>(&content) {
        Ok(states) => dedupe(states),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "state file is corrupt, starting empty");
            Vec::new()
        }
    }
}

/// Atomically replace the file at `path` with `states`.
///
/// The JSON is written and synced to `.<name>.tmp` in the same directory,
/// then renamed over `path`. On failure the temp file is removed and the
/// error returned; `path` keeps its previous contents.
pub fn save(path: &Path, states: &[PersistedState]) -> Result<(), StorageError> {
    let tmp_path = temp_path(path)?;
    if let Some(dir) = tmp_path.parent() {
        fs::create_dir_all(dir)?;
    }

    let result = write_then_rename(&tmp_path, path, states);
    if result.is_err() {
        if let Err(e) = fs::remove_file(&tmp_path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %tmp_path.display(), error = %e, "failed to remove temp state file");
            }
        }
    } else {
        debug!(path = %path.display(), records = states.len(), "state saved");
    }
    result
}

/// Drop records whose session date is strictly before `today`.
pub fn prune(states: Vec<PersistedState>, today: NaiveDate) -> Vec<PersistedState> {
    states.into_iter().filter(|s| s.date() >= today).collect()
}

/// Drop records whose anchor instant is strictly before `now`.
pub fn prune_expired(states: Vec<PersistedState>, now: DateTime<Utc>) -> Vec<PersistedState> {
    states.into_iter().filter(|s| s.anchor() >= now).collect()
}

fn temp_path(path: &Path) -> Result<PathBuf, StorageError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| StorageError::InvalidPath(path.display().to_string()))?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok(dir.join(format!(".{}.tmp", file_name.to_string_lossy())))
}

fn write_then_rename(
    tmp_path: &Path,
    path: &Path,
    states: &[PersistedState],
) -> Result<(), StorageError> {
    let json = serde_json::to_vec_pretty(states)?;
    let mut file = File::create(tmp_path)?;
    file.write_all(&json)?;
    file.sync_all()?;
    drop(file);
    fs::rename(tmp_path, path)?;
    Ok(())
}

fn dedupe(states: Vec<PersistedState>) -> Vec<PersistedState> {
    let mut seen = HashSet::new();
    let mut kept: Vec<PersistedState> = states
        .into_iter()
        .rev()
        .filter(|s| {
            let fresh = seen.insert(s.resource_id().to_string());
            if !fresh {
                warn!(resource_id = %s.resource_id(), "duplicate record in state file, keeping the last one");
            }
            fresh
        })
        .collect();
    kept.reverse();
    kept
}
