//! External maintenance sweep for the durable tier.
//!
//! The durable cache never evicts on its own; a deployment runs these
//! operations periodically (or by hand) to purge entries past a maximum
//! age and drop namespace directories once they are empty.

use revlens_core::{CacheError, RevlensResult};
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

/// Result of one purge pass over a namespace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    /// Entries removed.
    pub removed: usize,
    /// Bytes reclaimed by the removed entries.
    pub reclaimed_bytes: u64,
}

/// Size snapshot of a namespace directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NamespaceStats {
    pub files: usize,
    pub bytes: u64,
}

/// Remove cache entries whose file is older than `max_age`.
///
/// Age is judged by filesystem modification time. Files that cannot be
/// inspected or removed are skipped with a warning; the sweep keeps going.
pub fn purge_older_than(
    root_dir: impl AsRef<Path>,
    namespace: &str,
    max_age: Duration,
) -> RevlensResult<PurgeReport> {
    let dir = root_dir.as_ref().join(namespace);
    let entries = fs::read_dir(&dir).map_err(|e| CacheError::MaintenanceFailed {
        path: dir.display().to_string(),
        reason: e.to_string(),
    })?;

    let now = SystemTime::now();
    let mut report = PurgeReport::default();

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        let age = metadata
            .modified()
            .ok()
            .and_then(|mtime| now.duration_since(mtime).ok())
            .unwrap_or(Duration::ZERO);
        if age > max_age {
            match fs::remove_file(&path) {
                Ok(()) => {
                    report.removed += 1;
                    report.reclaimed_bytes += metadata.len();
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to purge cache entry");
                }
            }
        }
    }

    tracing::info!(
        namespace,
        removed = report.removed,
        reclaimed_bytes = report.reclaimed_bytes,
        "durable cache purge complete"
    );
    Ok(report)
}

/// Remove namespace directories that have become empty.
/// Returns the names of the directories that were removed.
pub fn remove_empty_namespaces(
    root_dir: impl AsRef<Path>,
    namespaces: &[&str],
) -> RevlensResult<Vec<String>> {
    let mut removed = Vec::new();
    for namespace in namespaces {
        let dir = root_dir.as_ref().join(namespace);
        if !dir.is_dir() {
            continue;
        }
        let is_empty = fs::read_dir(&dir)
            .map(|mut entries| entries.next().is_none())
            .map_err(|e| CacheError::MaintenanceFailed {
                path: dir.display().to_string(),
                reason: e.to_string(),
            })?;
        if is_empty {
            fs::remove_dir(&dir).map_err(|e| CacheError::MaintenanceFailed {
                path: dir.display().to_string(),
                reason: e.to_string(),
            })?;
            removed.push((*namespace).to_string());
        }
    }
    Ok(removed)
}

/// File count and total size for a namespace, for operator display.
pub fn namespace_stats(root_dir: impl AsRef<Path>, namespace: &str) -> NamespaceStats {
    let dir = root_dir.as_ref().join(namespace);
    let Ok(entries) = fs::read_dir(&dir) else {
        return NamespaceStats::default();
    };
    let mut stats = NamespaceStats::default();
    for entry in entries.flatten() {
        if let Ok(metadata) = entry.metadata() {
            if metadata.is_file() {
                stats.files += 1;
                stats.bytes += metadata.len();
            }
        }
    }
    stats
}

// =============================================================================
// TESTS
// =============================================================================
