// ⏱️ Record Cache - Time-bounded cache in front of the sheet loader
// Owned by whoever serves the dashboard. The analysis passes never see it:
// they receive a snapshot (Arc) and recompute everything from it.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::expense::ExpenseRecord;

struct CachedEntry<V> {
    loaded_at: Instant,
    value: Arc<V>,
}

/// Keyed cache whose entries expire `ttl` after they were loaded.
///
/// A failed load leaves the previous state untouched (an expired entry is
/// not served, but neither is it replaced by an error).
pub struct TtlCache<V> {
    ttl: Duration,
    entries: RwLock<HashMap<String, CachedEntry<V>>>,
}

/// Cache of loaded expense lists, keyed by data source
pub type RecordCache = TtlCache<Vec<ExpenseRecord>>;

impl<V> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        TtlCache {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh cached value, or the result of `load` (stored on success)
    pub fn get_or_load<F>(&self, key: &str, load: F) -> Result<Arc<V>>
    where
        F: FnOnce() -> Result<V>,
    {
        if let Some(value) = self.get_fresh(key) {
            debug!(key, "Record cache hit");
            return Ok(value);
        }

        debug!(key, "Record cache miss, loading");
        let value = Arc::new(load()?);

        // A cache that panicked mid-write still holds plain data
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            key.to_string(),
            CachedEntry {
                loaded_at: Instant::now(),
                value: Arc::clone(&value),
            },
        );

        Ok(value)
    }

    /// Cached value if it is younger than the TTL
    pub fn get_fresh(&self, key: &str) -> Option<Arc<V>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key)
            .filter(|entry| entry.loaded_at.elapsed() < self.ttl)
            .map(|entry| Arc::clone(&entry.value))
    }

    pub fn invalidate(&self, key: &str) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.clear();
    }
}

// ============================================================================
// TESTS
// ============================================================================
