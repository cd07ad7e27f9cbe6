//! Redis cache provider implementation.
//!
//! Compound operations run as Lua scripts so Redis executes them atomically.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;

use tokengate_core::error::{AppError, ErrorKind};
use tokengate_core::result::AppResult;
use tokengate_core::traits::cache::CacheProvider;

use super::client::RedisClient;

/// Conditional write.
///
/// KEYS[1] = key
/// ARGV[1] = value
/// ARGV[2] = forbidden current value
/// ARGV[3] = ttl seconds
///
/// Returns 1 if written, 0 if the current value was the forbidden one.
const SET_UNLESS_SCRIPT: &str = r#"
    if redis.call('GET', KEYS[1]) == ARGV[2] then
        return 0
    end
    redis.call('SET', KEYS[1], ARGV[1], 'EX', ARGV[3])
    return 1
"#;

/// Set insert that never shortens the set's lifetime.
///
/// KEYS[1] = set key
/// ARGV[1] = member
/// ARGV[2] = ttl seconds
const SET_ADD_SCRIPT: &str = r#"
    redis.call('SADD', KEYS[1], ARGV[1])
    local ttl = tonumber(ARGV[2])
    if redis.call('TTL', KEYS[1]) < ttl then
        redis.call('EXPIRE', KEYS[1], ttl)
    end
    return 1
"#;

/// Redis-backed cache provider.
#[derive(Debug, Clone)]
pub struct RedisCacheProvider {
    client: RedisClient,
}

impl RedisCacheProvider {
    /// Create a new Redis cache provider.
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    /// Map a Redis error to an AppError.
    fn map_err(e: redis::RedisError) -> AppError {
        AppError::with_source(ErrorKind::Cache, "Redis command failed", e)
    }

    /// Redis rejects `EX 0`; sub-second TTLs round up to one second.
    fn ttl_secs(ttl: Duration) -> u64 {
        ttl.as_secs().max(1)
    }
}

#[async_trait]
impl CacheProvider for RedisCacheProvider {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let result: Option<String> = conn.get(&full_key).await.map_err(Self::map_err)?;
        Ok(result)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let _: () = conn
            .set_ex(&full_key, value, Self::ttl_secs(ttl))
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn set_unless(
        &self,
        key: &str,
        value: &str,
        forbidden: &str,
        ttl: Duration,
    ) -> AppResult<bool> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();

        let written: i64 = redis::Script::new(SET_UNLESS_SCRIPT)
            .key(&full_key)
            .arg(value)
            .arg(forbidden)
            .arg(Self::ttl_secs(ttl))
            .invoke_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        Ok(written == 1)
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let _: () = conn.del(&full_key).await.map_err(Self::map_err)?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let result: bool = conn.exists(&full_key).await.map_err(Self::map_err)?;
        Ok(result)
    }

    async fn set_add(&self, key: &str, member: &str, ttl: Duration) -> AppResult<()> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();

        let _: i64 = redis::Script::new(SET_ADD_SCRIPT)
            .key(&full_key)
            .arg(member)
            .arg(Self::ttl_secs(ttl))
            .invoke_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        Ok(())
    }

    async fn set_members(&self, key: &str) -> AppResult<Vec<String>> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let members: Vec<String> = conn.smembers(&full_key).await.map_err(Self::map_err)?;
        Ok(members)
    }

    async fn set_remove(&self, key: &str, member: &str) -> AppResult<()> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let _: () = conn.srem(&full_key, member).await.map_err(Self::map_err)?;
        Ok(())
    }

    async fn health_check(&self) -> AppResult<bool> {
        let mut conn = self.client.conn_mut();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(pong == "PONG")
    }
}
