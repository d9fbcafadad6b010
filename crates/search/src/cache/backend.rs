//! Cache backend trait definition

use std::time::Duration;

use crate::error::CacheError;

/// Key/blob store backing the condition cache.
///
/// Operations on individual keys are atomic; nothing is guaranteed across
/// keys. Implementations must be safe to share between threads compiling
/// conditions concurrently.
pub trait CacheBackend: Send + Sync {
    /// Get a value from the cache
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Set a value in the cache with optional TTL
    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), CacheError>;

    /// Delete a key from the cache
    ///
    /// Returns `true` if the key existed before deletion. The return value
    /// is best-effort under concurrent access.
    fn delete(&self, key: &str) -> Result<bool, CacheError>;

    /// Backend name for debugging/logging
    fn backend_name(&self) -> &'static str;
}
