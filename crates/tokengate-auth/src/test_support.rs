//! Shared fixtures for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use tokengate_cache::CacheManager;
use tokengate_cache::memory::MemoryCacheProvider;
use tokengate_core::config::AuthConfig;
use tokengate_core::config::cache::MemoryCacheConfig;
use tokengate_core::error::AppError;
use tokengate_core::result::AppResult;
use tokengate_core::traits::CacheProvider;
use tokengate_database::UserRepository;
use tokengate_database::memory::{MemoryRefreshTokenRepository, MemoryUserRepository};
use tokengate_entity::user::{CreateUser, User};

use crate::identity::IdentityResolver;
use crate::jwt::JwtCodec;
use crate::password::{PasswordHasher, PasswordValidator};
use crate::refresh::RefreshTokenStore;
use crate::revocation::RevocationCache;
use crate::session::SessionManager;

pub fn auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "test-secret".to_string(),
        argon2_memory_kib: 64,
        argon2_iterations: 1,
        ..AuthConfig::default()
    }
}

pub fn codec() -> Arc<JwtCodec> {
    Arc::new(JwtCodec::from_config(&auth_config()))
}

pub fn memory_cache() -> Arc<CacheManager> {
    let provider = MemoryCacheProvider::new(&MemoryCacheConfig { max_capacity: 10_000 });
    Arc::new(CacheManager::from_provider(
        Arc::new(provider),
        Duration::from_secs(1),
    ))
}

pub fn revocation(cache: Arc<CacheManager>) -> RevocationCache {
    RevocationCache::new(cache, codec())
}

pub fn user(username: &str) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password_hash: String::new(),
        first_name: None,
        last_name: None,
        phone_number: None,
        birth_date: None,
        is_active: true,
        email_verified: false,
        last_password_change_at: now,
        created_at: now,
        updated_at: now,
    }
}

/// Cache whose reads report every key `active` and whose writes all fail.
#[derive(Debug)]
struct FailingWrites {
    members: Vec<String>,
}

#[async_trait]
impl CacheProvider for FailingWrites {
    async fn get(&self, _key: &str) -> AppResult<Option<String>> {
        Ok(Some("active".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> AppResult<()> {
        Err(AppError::cache("unavailable"))
    }

    async fn set_unless(
        &self,
        _key: &str,
        _value: &str,
        _forbidden: &str,
        _ttl: Duration,
    ) -> AppResult<bool> {
        Err(AppError::cache("unavailable"))
    }

    async fn delete(&self, _key: &str) -> AppResult<()> {
        Err(AppError::cache("unavailable"))
    }

    async fn exists(&self, _key: &str) -> AppResult<bool> {
        Ok(true)
    }

    async fn set_add(&self, _key: &str, _member: &str, _ttl: Duration) -> AppResult<()> {
        Err(AppError::cache("unavailable"))
    }

    async fn set_members(&self, _key: &str) -> AppResult<Vec<String>> {
        Ok(self.members.clone())
    }

    async fn set_remove(&self, _key: &str, _member: &str) -> AppResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(false)
    }
}

pub fn failing_writes_cache(members: Vec<String>) -> Arc<CacheManager> {
    Arc::new(CacheManager::from_provider(
        Arc::new(FailingWrites { members }),
        Duration::from_secs(1),
    ))
}

/// In-memory cache with switchable faults: reads can fail or stall, and
/// writes to keys naming a poisoned token always fail.
#[derive(Debug)]
pub struct FlakyCache {
    inner: MemoryCacheProvider,
    poisoned: Vec<String>,
    fail_reads: Arc<AtomicBool>,
    stall_reads: Arc<AtomicBool>,
}

/// Switches for a [`FlakyCache`] after it has been handed out.
#[derive(Debug, Clone)]
pub struct FaultSwitch {
    fail_reads: Arc<AtomicBool>,
    stall_reads: Arc<AtomicBool>,
}

impl FaultSwitch {
    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    pub fn stall_reads(&self) {
        self.stall_reads.store(true, Ordering::SeqCst);
    }
}

impl FlakyCache {
    fn poisoned(&self, key: &str) -> bool {
        self.poisoned.iter().any(|token| key.contains(token.as_str()))
    }
}

#[async_trait]
impl CacheProvider for FlakyCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::cache("read failed"));
        }
        if self.stall_reads.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        if self.poisoned(key) {
            return Err(AppError::cache("write failed"));
        }
        self.inner.set(key, value, ttl).await
    }

    async fn set_unless(
        &self,
        key: &str,
        value: &str,
        forbidden: &str,
        ttl: Duration,
    ) -> AppResult<bool> {
        self.inner.set_unless(key, value, forbidden, ttl).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        self.inner.exists(key).await
    }

    async fn set_add(&self, key: &str, member: &str, ttl: Duration) -> AppResult<()> {
        self.inner.set_add(key, member, ttl).await
    }

    async fn set_members(&self, key: &str) -> AppResult<Vec<String>> {
        self.inner.set_members(key).await
    }

    async fn set_remove(&self, key: &str, member: &str) -> AppResult<()> {
        self.inner.set_remove(key, member).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

/// A [`FlakyCache`] behind a manager with a short call deadline.
pub fn flaky_cache(poisoned: Vec<String>) -> (Arc<CacheManager>, FaultSwitch) {
    let switch = FaultSwitch {
        fail_reads: Arc::new(AtomicBool::new(false)),
        stall_reads: Arc::new(AtomicBool::new(false)),
    };
    let provider = FlakyCache {
        inner: MemoryCacheProvider::new(&MemoryCacheConfig { max_capacity: 10_000 }),
        poisoned,
        fail_reads: switch.fail_reads.clone(),
        stall_reads: switch.stall_reads.clone(),
    };
    let manager = CacheManager::from_provider(Arc::new(provider), Duration::from_millis(100));
    (Arc::new(manager), switch)
}

/// Every auth component wired over in-memory stores.
pub struct Harness {
    pub codec: Arc<JwtCodec>,
    pub revocation: Arc<RevocationCache>,
    pub refresh_store: Arc<RefreshTokenStore>,
    pub users: MemoryUserRepository,
    pub refresh_rows: MemoryRefreshTokenRepository,
    pub hasher: Arc<PasswordHasher>,
    pub session: SessionManager,
    pub resolver: IdentityResolver,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(adjust: impl FnOnce(&mut AuthConfig)) -> Self {
        let mut config = auth_config();
        adjust(&mut config);
        Self::build(config, memory_cache())
    }

    pub async fn with_cache(cache: Arc<CacheManager>) -> Self {
        Self::build(auth_config(), cache)
    }

    fn build(config: AuthConfig, cache: Arc<CacheManager>) -> Self {
        let codec = Arc::new(JwtCodec::from_config(&config));
        let users = MemoryUserRepository::new();
        let refresh_rows = MemoryRefreshTokenRepository::new();
        let revocation = Arc::new(RevocationCache::new(cache, codec.clone()));
        let refresh_store = Arc::new(RefreshTokenStore::new(
            Arc::new(refresh_rows.clone()),
            codec.clone(),
            &config,
        ));
        let hasher = Arc::new(PasswordHasher::new(&config).expect("argon2 params"));
        let session = SessionManager::new(
            codec.clone(),
            revocation.clone(),
            refresh_store.clone(),
            Arc::new(users.clone()),
            hasher.clone(),
            Arc::new(PasswordValidator::new(&config)),
            &config,
        );
        let resolver = IdentityResolver::new(
            codec.clone(),
            revocation.clone(),
            Arc::new(users.clone()),
        );

        Self {
            codec,
            revocation,
            refresh_store,
            users,
            refresh_rows,
            hasher,
            session,
            resolver,
        }
    }

    pub async fn add_user(&self, username: &str, password: &str) -> User {
        let password_hash = self.hasher.hash(password).await.expect("hash");
        self.users
            .create(&CreateUser {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password_hash,
                first_name: None,
                last_name: None,
                phone_number: None,
                birth_date: None,
            })
            .await
            .expect("create user")
    }
}
