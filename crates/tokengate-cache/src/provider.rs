//! Cache manager that dispatches to the configured provider.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use tokengate_core::config::cache::CacheConfig;
use tokengate_core::error::AppError;
use tokengate_core::result::AppResult;
use tokengate_core::timeout::with_timeout;
use tokengate_core::traits::cache::CacheProvider;

/// Cache manager that wraps the configured cache provider.
///
/// The provider is selected at construction time based on configuration.
/// Every call is bounded by the configured operation timeout.
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// The inner cache provider.
    inner: Arc<dyn CacheProvider>,
    /// Deadline applied to each call.
    timeout: Duration,
}

impl CacheManager {
    /// Create a new cache manager from configuration.
    pub async fn new(config: &CacheConfig) -> AppResult<Self> {
        let inner: Arc<dyn CacheProvider> = match config.provider.as_str() {
            #[cfg(feature = "redis-backend")]
            "redis" => {
                info!("Initializing Redis cache provider");
                let client = crate::redis::RedisClient::connect(&config.redis).await?;
                Arc::new(crate::redis::RedisCacheProvider::new(client))
            }
            #[cfg(feature = "memory")]
            "memory" => {
                info!("Initializing in-memory cache provider");
                Arc::new(crate::memory::MemoryCacheProvider::new(&config.memory))
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown cache provider: '{other}'. Supported: memory, redis"
                )));
            }
        };

        Ok(Self {
            inner,
            timeout: Duration::from_millis(config.operation_timeout_ms),
        })
    }

    /// Create a cache manager from an existing provider (for testing).
    pub fn from_provider(provider: Arc<dyn CacheProvider>, timeout: Duration) -> Self {
        Self {
            inner: provider,
            timeout,
        }
    }
}

#[async_trait]
impl CacheProvider for CacheManager {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        with_timeout("cache.get", self.timeout, self.inner.get(key)).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        with_timeout("cache.set", self.timeout, self.inner.set(key, value, ttl)).await
    }

    async fn set_unless(
        &self,
        key: &str,
        value: &str,
        forbidden: &str,
        ttl: Duration,
    ) -> AppResult<bool> {
        with_timeout(
            "cache.set_unless",
            self.timeout,
            self.inner.set_unless(key, value, forbidden, ttl),
        )
        .await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        with_timeout("cache.delete", self.timeout, self.inner.delete(key)).await
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        with_timeout("cache.exists", self.timeout, self.inner.exists(key)).await
    }

    async fn set_add(&self, key: &str, member: &str, ttl: Duration) -> AppResult<()> {
        with_timeout(
            "cache.set_add",
            self.timeout,
            self.inner.set_add(key, member, ttl),
        )
        .await
    }

    async fn set_members(&self, key: &str) -> AppResult<Vec<String>> {
        with_timeout("cache.set_members", self.timeout, self.inner.set_members(key)).await
    }

    async fn set_remove(&self, key: &str, member: &str) -> AppResult<()> {
        with_timeout(
            "cache.set_remove",
            self.timeout,
            self.inner.set_remove(key, member),
        )
        .await
    }

    async fn health_check(&self) -> AppResult<bool> {
        with_timeout("cache.health_check", self.timeout, self.inner.health_check()).await
    }
}
