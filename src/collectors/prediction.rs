use crate::error::CollectError;
use crate::models::snapshot::{Snapshot, SnapshotPair};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Pick the newest prediction file and the one `period` files older.
///
/// File names are date-stamped, so descending lexical order is newest first.
/// When fewer than `period + 1` files exist there is no older snapshot.
pub fn find_prediction_files(dir: &Path, period: usize) -> Result<(PathBuf, Option<PathBuf>), CollectError> {
    let pattern = dir.join("*.json");
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in glob::glob(&pattern.to_string_lossy())? {
        match entry {
            Ok(p)  => paths.push(p),
            Err(e) => tracing::warn!(error = %e, "unreadable prediction file entry"),
        }
    }
    paths.sort_by(|a, b| b.cmp(a));

    let latest = paths.first().cloned()
        .ok_or_else(|| CollectError::NoPredictionFiles(dir.to_path_buf()))?;
    let older = if period == 0 { None } else { paths.get(period).cloned() };
    Ok((latest, older))
}

/// Read and decode one prediction file.
pub fn load_snapshot(path: &Path) -> Result<Snapshot, CollectError> {
    let text = fs::read_to_string(path).map_err(|source| CollectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&text).map_err(|source| CollectError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    Snapshot::from_value(&value).map_err(|source| CollectError::Snapshot {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_pair(dir: &Path, period: usize) -> Result<SnapshotPair, CollectError> {
    let (latest_path, older_path) = find_prediction_files(dir, period)?;
    tracing::info!(
        latest = %latest_path.display(),
        older  = %older_path.as_deref().map(|p| p.display().to_string()).unwrap_or_else(|| "none".into()),
        "selected prediction files",
    );

    let latest = load_snapshot(&latest_path)?;
    let older = older_path.as_deref().map(load_snapshot).transpose()?;
    Ok(SnapshotPair { latest, older })
}
