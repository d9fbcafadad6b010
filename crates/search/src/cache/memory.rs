//! In-memory cache backend on moka.

use std::time::{Duration, Instant};

use moka::Expiry;
use moka::sync::Cache;

use super::backend::CacheBackend;
use crate::error::CacheError;

#[derive(Clone)]
struct CacheEntry {
    data: Vec<u8>,
    ttl: Option<Duration>,
}

/// Per-entry expiry tracking for variable TTLs
struct VariableTtlExpiry;

impl Expiry<String, CacheEntry> for VariableTtlExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl
    }
}

/// Bounded in-memory cache with per-entry TTL.
///
/// moka evicts with TinyLFU once `capacity` entries are stored.
pub struct InMemoryCache {
    cache: Cache<String, CacheEntry>,
}

impl InMemoryCache {
    /// Creates a cache holding at most `capacity` entries.
    pub fn new(capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .initial_capacity((capacity as usize / 4).min(10_000))
            .expire_after(VariableTtlExpiry)
            .build();
        Self { cache }
    }

    /// Number of stored entries; approximate until pending maintenance runs.
    pub fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }
}

impl CacheBackend for InMemoryCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.cache.get(key).map(|entry| entry.data))
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), CacheError> {
        self.cache
            .insert(key.to_string(), CacheEntry { data: value, ttl });
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.cache.remove(key).is_some())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_delete() {
        let cache = InMemoryCache::new(100);
        cache.set("a", b"one".to_vec(), None).unwrap();
        assert_eq!(cache.get("a").unwrap(), Some(b"one".to_vec()));
        assert!(cache.delete("a").unwrap());
        assert!(!cache.delete("a").unwrap());
        assert_eq!(cache.get("a").unwrap(), None);
    }

    #[test]
    fn test_ttl_expiry() {
        let cache = InMemoryCache::new(100);
        cache
            .set("short", b"x".to_vec(), Some(Duration::from_millis(20)))
            .unwrap();
        cache.set("long", b"y".to_vec(), None).unwrap();
        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(cache.get("short").unwrap(), None);
        assert_eq!(cache.get("long").unwrap(), Some(b"y".to_vec()));
    }
}
