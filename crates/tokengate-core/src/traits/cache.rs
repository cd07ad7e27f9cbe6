//! Cache provider trait for pluggable caching backends.

use std::time::Duration;

use async_trait::async_trait;

use crate::result::AppResult;

/// Trait for cache backends (Redis or in-memory).
///
/// Values are plain strings. Every write carries a TTL; the backend is
/// responsible for key prefixing and expiry. Single-key operations must be
/// atomic with respect to other operations on the same key.
#[async_trait]
pub trait CacheProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Get a value by key. Returns `None` if the key does not exist or has expired.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Set a value with a TTL, overwriting any previous value.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()>;

    /// Set a value with a TTL unless the current value equals `forbidden`.
    ///
    /// Returns `true` if the value was written. The check and the write happen
    /// as one atomic step.
    async fn set_unless(
        &self,
        key: &str,
        value: &str,
        forbidden: &str,
        ttl: Duration,
    ) -> AppResult<bool>;

    /// Delete a key from the cache.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Check whether a key exists in the cache.
    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Add a member to the set stored at `key`, extending the set's TTL to at
    /// least `ttl`.
    async fn set_add(&self, key: &str, member: &str, ttl: Duration) -> AppResult<()>;

    /// List the members of the set stored at `key`.
    async fn set_members(&self, key: &str) -> AppResult<Vec<String>>;

    /// Remove a member from the set stored at `key`.
    async fn set_remove(&self, key: &str, member: &str) -> AppResult<()>;

    /// Check that the cache backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
