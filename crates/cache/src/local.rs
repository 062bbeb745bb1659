//! In-process TTL cache backed by DashMap for lock-free concurrent access.
//! Used to avoid recomputation of reference-data lookups (active tiers,
//! discount catalogs); never for customer scores.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// Lock-free local cache for frequently accessed reference data.
pub struct LocalCache<V: Clone> {
    store: Arc<DashMap<String, CacheEntry<V>>>,
    ttl: Duration,
    max_entries: usize,
}

impl<V: Clone> LocalCache<V> {
    pub fn new(ttl_secs: u64, max_entries: usize) -> Self {
        Self {
            store: Arc::new(DashMap::with_capacity(max_entries)),
            ttl: Duration::from_secs(ttl_secs),
            max_entries,
        }
    }

    /// Get a value from the cache, returns None if expired or missing.
    pub fn get(&self, key: &str) -> Option<V> {
        let entry = self.store.get(key)?;
        if entry.inserted_at.elapsed() > self.ttl {
            drop(entry);
            self.store.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    /// Whether a non-expired entry exists for this key.
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or update a value.
    pub fn put(&self, key: String, value: V) {
        // Simple eviction: if over capacity, skip insert (periodic cleanup handles this)
        if self.store.len() >= self.max_entries && !self.store.contains_key(&key) {
            return;
        }
        self.store.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop a key unconditionally.
    pub fn forget(&self, key: &str) {
        self.store.remove(key);
    }

    /// Return the cached value for `key`, computing and storing it on a miss.
    /// Failed computations are not cached.
    pub fn remember<E>(
        &self,
        key: &str,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        debug!(key = key, "Cache miss, computing");
        let value = compute()?;
        self.put(key.to_string(), value.clone());
        Ok(value)
    }

    /// Remove expired entries. Call this periodically from a background task.
    pub fn evict_expired(&self) -> usize {
        let before = self.store.len();
        self.store
            .retain(|_, entry| entry.inserted_at.elapsed() <= self.ttl);
        before - self.store.len()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_forget() {
        let cache: LocalCache<u32> = LocalCache::new(60, 8);
        cache.put("a".to_string(), 1);
        assert_eq!(cache.get("a"), Some(1));
        assert!(cache.has("a"));
        cache.forget("a");
        assert!(!cache.has("a"));
    }

    #[test]
    fn test_remember_computes_once() {
        let cache: LocalCache<u32> = LocalCache::new(60, 8);
        let mut calls = 0;
        let first: Result<u32, ()> = cache.remember("k", || {
            calls += 1;
            Ok(7)
        });
        assert_eq!(first, Ok(7));
        let second: Result<u32, ()> = cache.remember("k", || {
            calls += 1;
            Ok(9)
        });
        assert_eq!(second, Ok(7));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_remember_does_not_cache_failures() {
        let cache: LocalCache<u32> = LocalCache::new(60, 8);
        let failed: Result<u32, &str> = cache.remember("k", || Err("boom"));
        assert!(failed.is_err());
        let ok: Result<u32, &str> = cache.remember("k", || Ok(3));
        assert_eq!(ok, Ok(3));
    }

    #[test]
    fn test_capacity_skips_new_keys() {
        let cache: LocalCache<u32> = LocalCache::new(60, 1);
        cache.put("a".to_string(), 1);
        cache.put("b".to_string(), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("b").is_none());
        // Existing keys still update
        cache.put("a".to_string(), 5);
        assert_eq!(cache.get("a"), Some(5));
    }
}
