//! Compiled fragment cache.
//!
//! Compiling a condition is deterministic, so the result for a given
//! (field set, backend, condition) can be reused. The cache is advisory: a
//! failing backend is logged and treated as a miss, and a hit is always
//! equal to what a fresh compilation would return.

mod backend;
mod fingerprint;
mod memory;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::backends::{CompiledFragment, ConditionGenerator};
use crate::error::{CacheError, GenerationResult};
use crate::types::SearchCondition;

pub use backend::CacheBackend;
pub use fingerprint::condition_fingerprint;
pub use memory::InMemoryCache;

/// Stores compiled fragments in a [`CacheBackend`] keyed by fingerprint.
#[derive(Clone)]
pub struct ConditionCache {
    backend: Arc<dyn CacheBackend>,
    ttl: Option<Duration>,
}

impl ConditionCache {
    /// Creates a cache over `backend`; `ttl` of `None` keeps entries until evicted.
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Option<Duration>) -> Self {
        Self { backend, ttl }
    }

    /// An in-memory cache holding at most `capacity` fragments.
    pub fn in_memory(capacity: u64, ttl: Option<Duration>) -> Self {
        Self::new(Arc::new(InMemoryCache::new(capacity)), ttl)
    }

    /// Looks up a fragment. Backend and decoding failures count as a miss.
    pub fn get(&self, fingerprint: &str) -> Option<CompiledFragment> {
        match self.try_get(fingerprint) {
            Ok(fragment) => fragment,
            Err(e) => {
                warn!(
                    backend = self.backend.backend_name(),
                    error = %e,
                    "Condition cache lookup failed"
                );
                None
            }
        }
    }

    /// Stores a fragment. Failures are logged and otherwise ignored.
    pub fn put(&self, fingerprint: &str, fragment: &CompiledFragment) {
        if let Err(e) = self.try_put(fingerprint, fragment) {
            warn!(
                backend = self.backend.backend_name(),
                error = %e,
                "Condition cache store failed"
            );
        }
    }

    /// Removes a fragment.
    pub fn invalidate(&self, fingerprint: &str) -> Result<bool, CacheError> {
        self.backend.delete(fingerprint)
    }

    fn try_get(&self, fingerprint: &str) -> Result<Option<CompiledFragment>, CacheError> {
        match self.backend.get(fingerprint)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn try_put(&self, fingerprint: &str, fragment: &CompiledFragment) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(fragment)?;
        self.backend.set(fingerprint, bytes, self.ttl)
    }
}

impl std::fmt::Debug for ConditionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionCache")
            .field("backend", &self.backend.backend_name())
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// A generator that consults a [`ConditionCache`] before compiling.
///
/// Errors are never cached.
#[derive(Debug)]
pub struct CachedGenerator<G> {
    inner: G,
    cache: ConditionCache,
}

impl<G: ConditionGenerator> CachedGenerator<G> {
    /// Wraps `inner`.
    pub fn new(inner: G, cache: ConditionCache) -> Self {
        Self { inner, cache }
    }

    /// The wrapped generator.
    pub fn inner(&self) -> &G {
        &self.inner
    }

    /// The cache in use.
    pub fn cache(&self) -> &ConditionCache {
        &self.cache
    }
}

impl<G: ConditionGenerator> ConditionGenerator for CachedGenerator<G> {
    fn backend_id(&self) -> String {
        self.inner.backend_id()
    }

    fn compile(&self, condition: &SearchCondition) -> GenerationResult<CompiledFragment> {
        // The fingerprint covers values only; a condition with validation
        // errors must never reach the cache.
        if condition.has_errors() {
            return self.inner.compile(condition);
        }

        let fingerprint = condition_fingerprint(condition, &self.inner.backend_id());
        if let Some(fragment) = self.cache.get(&fingerprint) {
            debug!(fingerprint = %fingerprint, "Condition cache hit");
            return Ok(fragment);
        }

        let fragment = self.inner.compile(condition)?;
        self.cache.put(&fingerprint, &fragment);
        debug!(fingerprint = %fingerprint, "Condition cache miss");
        Ok(fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::sql::SqlFragment;

    /// Backend failing every operation.
    struct BrokenBackend;

    impl CacheBackend for BrokenBackend {
        fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
            Err(CacheError::Backend {
                message: "down".to_string(),
            })
        }

        fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Option<Duration>) -> Result<(), CacheError> {
            Err(CacheError::Backend {
                message: "down".to_string(),
            })
        }

        fn delete(&self, _key: &str) -> Result<bool, CacheError> {
            Ok(false)
        }

        fn backend_name(&self) -> &'static str {
            "broken"
        }
    }

    #[test]
    fn test_round_trip() {
        let cache = ConditionCache::in_memory(10, None);
        let fragment = CompiledFragment::Sql(SqlFragment::new("a = 1"));
        assert!(cache.get("k").is_none());
        cache.put("k", &fragment);
        assert_eq!(cache.get("k"), Some(fragment));
        assert!(cache.invalidate("k").unwrap());
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn test_failures_are_misses() {
        let cache = ConditionCache::new(Arc::new(BrokenBackend), None);
        cache.put("k", &CompiledFragment::Document(serde_json::json!({})));
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let backend = Arc::new(InMemoryCache::new(10));
        backend.set("k", b"not json".to_vec(), None).unwrap();
        let cache = ConditionCache::new(backend, None);
        assert!(cache.get("k").is_none());
    }
}
