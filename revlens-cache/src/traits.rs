//! Cache tier trait and statistics.
//!
//! The engine depends on this trait, not on a concrete tier or a process
//! singleton, so tests and callers can construct independent caches and
//! choose the tier per operation.

use revlens_core::CacheKey;
use std::time::Duration;

/// The cache seam the enrichment engine consumes.
///
/// Operations never suspend: both tiers resolve synchronously (in-process
/// map or local filesystem). Implementations must be safe for concurrent
/// callers sharing one instance.
pub trait EnrichmentCache: Send + Sync {
    /// Returns the cached value if present and not expired.
    /// A corrupt or unreadable entry is a miss, never an error.
    fn get(&self, key: &CacheKey) -> Option<String>;

    /// Stores a value. Write failures are logged, not surfaced: the
    /// computed value is still returned to the caller for this run, it
    /// simply will not be cached for future runs.
    fn set(&self, key: &CacheKey, value: &str);

    /// Removes all entries immediately.
    fn clear(&self);

    /// Snapshot of the tier, for display purposes only.
    fn stats(&self) -> CacheStats;
}

/// Statistics about a cache tier.
///
/// `capacity` and `ttl` are `None` for tiers without those bounds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries physically present, valid or not.
    pub total_items: usize,
    /// Entries that a read at snapshot time would return.
    pub valid_items: usize,
    /// Entries past their TTL but not yet lazily removed.
    pub expired_items: usize,
    /// Configured capacity, if bounded.
    pub capacity: Option<usize>,
    /// Configured time-to-live, if any.
    pub ttl: Option<Duration>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_default_is_empty() {
        let stats = CacheStats::default();
        assert_eq!(stats.total_items, 0);
        assert_eq!(stats.capacity, None);
        assert_eq!(stats.ttl, None);
    }
}
