//! Shared fixtures for unit tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use tokengate_auth::{
    IdentityResolver, JwtCodec, LinkSigner, PasswordHasher, PasswordValidator, RefreshTokenStore,
    RevocationCache, SessionManager,
};
use tokengate_cache::CacheManager;
use tokengate_cache::memory::MemoryCacheProvider;
use tokengate_core::config::AuthConfig;
use tokengate_core::config::cache::MemoryCacheConfig;
use tokengate_core::error::AppError;
use tokengate_core::result::AppResult;
use tokengate_core::traits::Mailer;
use tokengate_database::UserRepository;
use tokengate_database::memory::{MemoryRefreshTokenRepository, MemoryUserRepository};
use tokengate_entity::user::{CreateUser, User};

use crate::mail::MailDispatcher;
use crate::user::{RecoveryService, UserService};

#[derive(Debug, Clone)]
pub struct SentMail {
    pub kind: &'static str,
    pub to: String,
    pub link: String,
}

/// Mailer that keeps every message in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<SentMail>>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub async fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().await.clone()
    }

    async fn record(&self, kind: &'static str, to: &str, link: &str) -> AppResult<()> {
        if self.fail {
            return Err(AppError::internal("relay unavailable"));
        }
        self.sent.lock().await.push(SentMail {
            kind,
            to: to.to_string(),
            link: link.to_string(),
        });
        Ok(())
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_password_reset_email(&self, email: &str, reset_link: &str) -> AppResult<()> {
        self.record("password_reset", email, reset_link).await
    }

    async fn send_account_confirmation_email(
        &self,
        email: &str,
        verify_link: &str,
    ) -> AppResult<()> {
        self.record("account_confirmation", email, verify_link).await
    }
}

/// Services wired over in-memory stores.
pub struct Harness {
    pub user_repo: MemoryUserRepository,
    pub hasher: Arc<PasswordHasher>,
    pub sessions: Arc<SessionManager>,
    pub resolver: IdentityResolver,
    pub users: UserService,
    pub recovery: RecoveryService,
    pub mailer: RecordingMailer,
}

impl Harness {
    pub fn new() -> Self {
        let config = AuthConfig {
            jwt_secret: "test-secret".to_string(),
            argon2_memory_kib: 64,
            argon2_iterations: 1,
            ..AuthConfig::default()
        };

        let cache = Arc::new(CacheManager::from_provider(
            Arc::new(MemoryCacheProvider::new(&MemoryCacheConfig {
                max_capacity: 10_000,
            })),
            Duration::from_secs(1),
        ));
        let user_repo = MemoryUserRepository::new();
        let users_dyn: Arc<dyn UserRepository> = Arc::new(user_repo.clone());

        let codec = Arc::new(JwtCodec::from_config(&config));
        let revocation = Arc::new(RevocationCache::new(cache, codec.clone()));
        let refresh_store = Arc::new(RefreshTokenStore::new(
            Arc::new(MemoryRefreshTokenRepository::new()),
            codec.clone(),
            &config,
        ));
        let hasher = Arc::new(PasswordHasher::new(&config).expect("argon2 params"));
        let validator = Arc::new(PasswordValidator::new(&config));
        let sessions = Arc::new(SessionManager::new(
            codec.clone(),
            revocation.clone(),
            refresh_store,
            users_dyn.clone(),
            hasher.clone(),
            validator.clone(),
            &config,
        ));
        let resolver = IdentityResolver::new(codec, revocation.clone(), users_dyn.clone());

        let mailer = RecordingMailer::default();
        let links = Arc::new(LinkSigner::new(&config, "http://localhost:3000"));
        let users = UserService::new(
            users_dyn.clone(),
            hasher.clone(),
            validator.clone(),
            sessions.clone(),
        );
        let recovery = RecoveryService::new(
            users_dyn,
            hasher.clone(),
            validator,
            links,
            sessions.clone(),
            revocation.clone(),
            MailDispatcher::new(Arc::new(mailer.clone())),
        );

        Self {
            user_repo,
            hasher,
            sessions,
            resolver,
            users,
            recovery,
            mailer,
        }
    }

    pub async fn add_user(&self, username: &str, password: &str) -> User {
        let password_hash = self.hasher.hash(password).await.expect("hash");
        self.user_repo
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
