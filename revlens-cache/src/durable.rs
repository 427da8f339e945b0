//! File-backed, content-addressed durable cache.
//!
//! One JSON file per cache key under `root_dir/namespace/`. No TTL, no
//! capacity bound, no eviction: size management belongs to the external
//! maintenance sweep in [`crate::maintenance`].
//!
//! Read-before-write at the call site is the contract; the cache itself
//! does not deduplicate concurrent writers. Two workers racing on the
//! same fingerprint both write the identical value, which is harmless
//! because keys are content-addressed.

use crate::traits::{CacheStats, EnrichmentCache};
use chrono::Utc;
use revlens_core::{CacheError, CacheKey, DurableCacheConfig, RevlensResult, Timestamp};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted cache entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DurableEntry {
    value: String,
    stored_at: Timestamp,
}

/// Persistent, unbounded, content-addressed cache tier.
pub struct DurableCache {
    dir: PathBuf,
}

impl DurableCache {
    /// Open (creating if needed) the namespace directory for this cache.
    pub fn open(config: &DurableCacheConfig) -> RevlensResult<Self> {
        let dir = config.root_dir.join(&config.namespace);
        fs::create_dir_all(&dir).map_err(|e| CacheError::CreateDirFailed {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { dir })
    }

    /// Open a namespace directly under a root, bypassing config.
    pub fn open_at(root_dir: impl AsRef<Path>, namespace: &str) -> RevlensResult<Self> {
        Self::open(&DurableCacheConfig::new(
            root_dir.as_ref().to_path_buf(),
            namespace,
        ))
    }

    /// The namespace directory backing this cache.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Persist a value, surfacing the write error to the caller.
    /// The [`EnrichmentCache`] impl wraps this and downgrades failures
    /// to a log line.
    pub fn try_set(&self, key: &CacheKey, value: &str) -> RevlensResult<()> {
        let entry = DurableEntry {
            value: value.to_string(),
            stored_at: Utc::now(),
        };
        let bytes = serde_json::to_vec(&entry).map_err(|e| CacheError::WriteFailed {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        fs::write(self.entry_path(key), bytes).map_err(|e| {
            CacheError::WriteFailed {
                key: key.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }
}

impl EnrichmentCache for DurableCache {
    fn get(&self, key: &CacheKey) -> Option<String> {
        // Any read failure, including a corrupt entry, is a miss.
        let bytes = fs::read(self.entry_path(key)).ok()?;
        let entry: DurableEntry = serde_json::from_slice(&bytes).ok()?;
        Some(entry.value)
    }

    fn set(&self, key: &CacheKey, value: &str) {
        if let Err(e) = self.try_set(key, value) {
            tracing::warn!(key = %key, error = %e, "durable cache write failed");
        }
    }

    fn clear(&self) {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Err(e) = fs::remove_file(&path) {
                    tracing::warn!(path = %path.display(), error = %e, "failed to remove cache entry");
                }
            }
        }
    }

    fn stats(&self) -> CacheStats {
        let total = fs::read_dir(&self.dir)
            .map(|entries| {
                entries
                    .flatten()
                    .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
                    .count()
            })
            .unwrap_or(0);
        // No TTL: every present entry is valid.
        CacheStats {
            total_items: total,
            valid_items: total,
            expired_items: 0,
            capacity: None,
            ttl: None,
        }
    }
}

impl std::fmt::Debug for DurableCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableCache")
            .field("dir", &self.dir)
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
