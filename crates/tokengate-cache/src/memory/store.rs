//! In-memory cache implementation using the moka crate.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use moka::Expiry;
use moka::future::Cache;
use tokio::sync::Mutex;

use tokengate_core::config::cache::MemoryCacheConfig;
use tokengate_core::result::AppResult;
use tokengate_core::traits::cache::CacheProvider;

/// A cached string together with the TTL it was written with.
#[derive(Debug, Clone)]
struct Entry {
    value: String,
    ttl: Duration,
}

/// Per-entry expiry: each write restarts the clock with its own TTL.
struct EntryExpiry;

impl Expiry<String, Entry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// Members of a set key and the instant the whole set expires.
#[derive(Debug)]
struct MemberSet {
    members: HashSet<String>,
    expires_at: Instant,
}

/// In-memory cache provider using moka.
///
/// Suitable for single-node deployments and tests only.
#[derive(Debug, Clone)]
pub struct MemoryCacheProvider {
    /// String entries with per-entry TTL.
    cache: Cache<String, Entry>,
    /// Set entries.
    sets: Arc<DashMap<String, MemberSet>>,
    /// Serializes writers so check-then-write sequences are atomic.
    write_lock: Arc<Mutex<()>>,
}

impl MemoryCacheProvider {
    /// Create a new in-memory cache from configuration.
    pub fn new(config: &MemoryCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(EntryExpiry)
            .build();

        Self {
            cache,
            sets: Arc::new(DashMap::new()),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    async fn insert(&self, key: &str, value: &str, ttl: Duration) {
        self.cache
            .insert(
                key.to_string(),
                Entry {
                    value: value.to_string(),
                    ttl,
                },
            )
            .await;
    }
}

#[async_trait]
impl CacheProvider for MemoryCacheProvider {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.cache.get(key).await.map(|entry| entry.value))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        self.insert(key, value, ttl).await;
        Ok(())
    }

    async fn set_unless(
        &self,
        key: &str,
        value: &str,
        forbidden: &str,
        ttl: Duration,
    ) -> AppResult<bool> {
        let _guard = self.write_lock.lock().await;
        if let Some(current) = self.cache.get(key).await {
            if current.value == forbidden {
                return Ok(false);
            }
        }
        self.insert(key, value, ttl).await;
        Ok(true)
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        self.cache.invalidate(key).await;
        self.sets.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.cache.get(key).await.is_some())
    }

    async fn set_add(&self, key: &str, member: &str, ttl: Duration) -> AppResult<()> {
        let now = Instant::now();
        let expires_at = now + ttl;
        let mut set = self.sets.entry(key.to_string()).or_insert_with(|| MemberSet {
            members: HashSet::new(),
            expires_at,
        });
        if set.expires_at <= now {
            set.members.clear();
        }
        set.members.insert(member.to_string());
        if set.expires_at < expires_at {
            set.expires_at = expires_at;
        }
        Ok(())
    }

    async fn set_members(&self, key: &str) -> AppResult<Vec<String>> {
        let now = Instant::now();
        let members = match self.sets.get(key) {
            Some(set) if set.expires_at > now => set.members.iter().cloned().collect(),
            _ => Vec::new(),
        };
        if members.is_empty() {
            self.sets.remove_if(key, |_, set| set.expires_at <= now);
        }
        Ok(members)
    }

    async fn set_remove(&self, key: &str, member: &str) -> AppResult<()> {
        if let Some(mut set) = self.sets.get_mut(key) {
            set.members.remove(member);
        }
        self.sets.remove_if(key, |_, set| set.members.is_empty());
        Ok(())
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}
