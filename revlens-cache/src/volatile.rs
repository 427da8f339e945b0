//! In-process LRU cache with TTL expiry.
//!
//! Semantics:
//! - size never exceeds capacity; inserting a new key at capacity evicts
//!   the least-recently-used entry first;
//! - an entry older than the TTL is treated as absent on read and removed
//!   lazily at that point, never by a background sweep;
//! - recency is refreshed on both read-hit and write.
//!
//! A single mutex guards the map; operations are short and never suspend.

use crate::traits::{CacheStats, EnrichmentCache};
use revlens_core::{CacheKey, VolatileCacheConfig};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Slot {
    value: String,
    stored_at: Instant,
    last_access: u64,
}

struct Inner {
    map: HashMap<CacheKey, Slot>,
    /// Monotonic access counter; higher = more recently used.
    tick: u64,
}

/// Capacity-bounded, time-expiring, thread-safe cache.
pub struct VolatileCache {
    inner: Mutex<Inner>,
    capacity: usize,
    ttl: Duration,
}

impl VolatileCache {
    pub fn new(config: VolatileCacheConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                map: HashMap::new(),
                tick: 0,
            }),
            capacity: config.capacity.max(1),
            ttl: config.ttl,
        }
    }

    /// Cache with the default capacity (2000) and TTL (24h).
    pub fn with_defaults() -> Self {
        Self::new(VolatileCacheConfig::default())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|inner| inner.map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EnrichmentCache for VolatileCache {
    fn get(&self, key: &CacheKey) -> Option<String> {
        let mut inner = self.inner.lock().ok()?;
        let expired = match inner.map.get(key) {
            Some(slot) => slot.stored_at.elapsed() >= self.ttl,
            None => return None,
        };
        if expired {
            // Lazy eviction of the discovered-expired entry.
            inner.map.remove(key);
            return None;
        }
        inner.tick += 1;
        let tick = inner.tick;
        let slot = inner.map.get_mut(key)?;
        slot.last_access = tick;
        Some(slot.value.clone())
    }

    fn set(&self, key: &CacheKey, value: &str) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        if !inner.map.contains_key(key) && inner.map.len() >= self.capacity {
            let lru = inner
                .map
                .iter()
                .min_by_key(|(_, slot)| slot.last_access)
                .map(|(k, _)| k.clone());
            if let Some(lru_key) = lru {
                inner.map.remove(&lru_key);
            }
        }
        inner.tick += 1;
        let tick = inner.tick;
        inner.map.insert(
            key.clone(),
            Slot {
                value: value.to_string(),
                stored_at: Instant::now(),
                last_access: tick,
            },
        );
    }

    fn clear(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.map.clear();
        }
    }

    fn stats(&self) -> CacheStats {
        let Ok(inner) = self.inner.lock() else {
            return CacheStats::default();
        };
        let mut valid = 0;
        let mut expired = 0;
        for slot in inner.map.values() {
            if slot.stored_at.elapsed() < self.ttl {
                valid += 1;
            } else {
                expired += 1;
            }
        }
        CacheStats {
            total_items: inner.map.len(),
            valid_items: valid,
            expired_items: expired,
            capacity: Some(self.capacity),
            ttl: Some(self.ttl),
        }
    }
}

impl std::fmt::Debug for VolatileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VolatileCache")
            .field("capacity", &self.capacity)
            .field("ttl", &self.ttl)
            .field("len", &self.len())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================


// =============================================================================
// PROPERTY-BASED TESTS
// =============================================================================
