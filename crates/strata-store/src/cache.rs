//! Merge cache using moka
//!
//! Memoizes the forced merge result of each top-level key. Entries are only
//! ever removed (point or full invalidation, or capacity eviction); an
//! evicted key is simply recomputed on its next read.

use moka::sync::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use strata_value::Value;

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of entries in cache
    pub entry_count: u64,
    /// Reads served from the cache
    pub hits: u64,
    /// Reads that had to merge
    pub misses: u64,
    /// Point and full invalidations performed
    pub invalidations: u64,
}

/// Per-store cache of merge results keyed by top-level key
#[derive(Debug)]
pub struct MergeCache {
    inner: Cache<String, Arc<Value>>,
    hits: AtomicU64,
    misses: AtomicU64,
    invalidations: AtomicU64,
}

impl MergeCache {
    /// Create new cache with max capacity
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::new(max_capacity),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
        }
    }

    /// Cached merge result for `key`, counting the hit or miss
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Arc<Value>> {
        let found = self.inner.get(key);
        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Store a merge result; only the owning store may fill the cache
    #[inline]
    pub(crate) fn insert(&self, key: String, value: Arc<Value>) {
        self.inner.insert(key, value);
    }

    /// Drop the entry for one top-level key
    #[inline]
    pub fn invalidate(&self, key: &str) {
        self.inner.invalidate(key);
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    /// Drop every entry
    #[inline]
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    /// Check if an entry is cached (does not count as a read)
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Snapshot of every live entry
    #[must_use]
    pub fn entries(&self) -> Vec<(String, Arc<Value>)> {
        self.inner
            .iter()
            .filter(|(key, _)| self.inner.contains_key(key.as_str()))
            .map(|(key, value)| (String::clone(&key), value))
            .collect()
    }

    /// Get cache statistics
    ///
    /// Pending evictions are applied first so `entry_count` is exact.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.inner.run_pending_tasks();
        CacheStats {
            entry_count: self.inner.entry_count(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }
}

impl Default for MergeCache {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_CACHE_CAPACITY)
    }
}
