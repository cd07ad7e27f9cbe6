//! Session lifecycle manager: login, refresh, logout, password change.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use tokengate_core::config::AuthConfig;
use tokengate_core::error::AppError;
use tokengate_core::result::AppResult;
use tokengate_database::UserRepository;
use tokengate_entity::user::User;

use crate::identity::Principal;
use crate::jwt::codec::remaining_seconds_of;
use crate::jwt::{JwtCodec, TokenType, fingerprint};
use crate::password::{PasswordHasher, PasswordValidator};
use crate::refresh::RefreshTokenStore;
use crate::revocation::{RevocationCache, RevocationReport, ttl_from_seconds};

/// Result of a successful login or refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Access token for the `Authorization: Bearer` header.
    pub access_token: String,
    /// Refresh token for obtaining the next pair.
    pub refresh_token: String,
    /// Always `"bearer"`.
    pub token_type: String,
    /// When the access token expires.
    pub access_token_expires_at: DateTime<Utc>,
    /// When the refresh token expires.
    pub refresh_token_expires_at: DateTime<Utc>,
}

/// Ties the codec, the revocation cache, and the refresh token store
/// together.
///
/// ```text
/// ANONYMOUS --login--> AUTHENTICATED --refresh--> AUTHENTICATED (new pair)
///                            |
///                            +--logout / logout_all / change_password--> REVOKED
/// ```
#[derive(Clone)]
pub struct SessionManager {
    /// Token codec.
    codec: Arc<JwtCodec>,
    /// Access token state.
    revocation: Arc<RevocationCache>,
    /// Refresh token rows.
    refresh_store: Arc<RefreshTokenStore>,
    /// User repository.
    user_repo: Arc<dyn UserRepository>,
    /// Password hasher.
    password_hasher: Arc<PasswordHasher>,
    /// Policy for new passwords.
    password_validator: Arc<PasswordValidator>,
    /// Access token lifetime.
    access_ttl: Duration,
    /// Deactivate a refresh token when it is exchanged.
    rotate_refresh_tokens: bool,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("access_ttl", &self.access_ttl)
            .field("rotate_refresh_tokens", &self.rotate_refresh_tokens)
            .finish()
    }
}

impl SessionManager {
    /// Creates a new session manager with all required dependencies.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        codec: Arc<JwtCodec>,
        revocation: Arc<RevocationCache>,
        refresh_store: Arc<RefreshTokenStore>,
        user_repo: Arc<dyn UserRepository>,
        password_hasher: Arc<PasswordHasher>,
        password_validator: Arc<PasswordValidator>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            codec,
            revocation,
            refresh_store,
            user_repo,
            password_hasher,
            password_validator,
            access_ttl: Duration::from_secs(config.access_token_ttl_seconds),
            rotate_refresh_tokens: config.rotate_refresh_tokens,
        }
    }

    /// Verifies credentials and opens a session.
    ///
    /// Unknown user, wrong password, and deactivated account all fail with
    /// the same `InvalidCredentials`.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<TokenPair> {
        let Some(user) = self.user_repo.find_by_username(username).await? else {
            self.password_hasher.verify_decoy(password).await?;
            info!(username = %username, "Login failed");
            return Err(AppError::invalid_credentials());
        };

        if !self
            .password_hasher
            .verify(password, &user.password_hash)
            .await?
            || !user.is_active
        {
            info!(username = %username, "Login failed");
            return Err(AppError::invalid_credentials());
        }

        let pair = self.open_session(&user).await?;
        info!(user_id = %user.id, username = %user.username, "Login successful");
        Ok(pair)
    }

    /// Exchanges a refresh token for a new pair.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let claims = self.codec.decode(refresh_token)?;
        if claims.typ != TokenType::Refresh {
            return Err(AppError::token_invalid("Not a refresh token"));
        }

        let user = self
            .user_repo
            .find_by_username(&claims.sub)
            .await?
            .ok_or_else(|| AppError::token_invalid("Token subject does not exist"))?;
        if !user.is_active {
            return Err(AppError::unauthenticated("Account is deactivated"));
        }

        let row = self.refresh_store.validate(refresh_token).await?;
        if row.user_id != user.id {
            warn!(
                user_id = %user.id,
                token = %fingerprint(refresh_token),
                "Refresh token row belongs to another user"
            );
            return Err(AppError::token_invalid("Refresh token does not match its subject"));
        }

        if self.rotate_refresh_tokens {
            self.refresh_store.consume(&row).await?;
        }

        let pair = self.open_session(&user).await?;
        info!(user_id = %user.id, "Session refreshed");
        Ok(pair)
    }

    /// Revokes the presented access token.
    ///
    /// Fails with `TokenExpired` if the token is not currently active.
    pub async fn logout(&self, access_token: &str) -> AppResult<()> {
        let claims = self.codec.decode(access_token)?;
        if !self.revocation.is_active(&claims.sub, access_token).await? {
            return Err(AppError::token_expired("Token is no longer active"));
        }

        let remaining = remaining_seconds_of(&claims)?;
        self.revocation
            .blacklist(&claims.sub, access_token, ttl_from_seconds(remaining))
            .await?;

        info!(username = %claims.sub, token = %fingerprint(access_token), "Logged out");
        Ok(())
    }

    /// Revokes every access token and refresh token of the user.
    pub async fn logout_all(&self, user: &User) -> AppResult<RevocationReport> {
        let report = self
            .revocation
            .blacklist_all_for_user(&user.username)
            .await?;
        self.refresh_store.deactivate_all(user.id).await?;
        Ok(report)
    }

    /// Replaces the password and revokes every outstanding session,
    /// starting with the one that asked.
    pub async fn change_password(
        &self,
        principal: &Principal,
        old_password: &str,
        new_password: &str,
    ) -> AppResult<RevocationReport> {
        let user = &principal.user;

        if !self
            .password_hasher
            .verify(old_password, &user.password_hash)
            .await?
        {
            return Err(AppError::invalid_credentials());
        }

        self.password_validator
            .validate_not_same(old_password, new_password)?;
        self.password_validator
            .validate(new_password, &[&user.username, &user.email])?;

        let hash = self.password_hasher.hash(new_password).await?;
        let now = Utc::now();
        self.user_repo.update_password(user.id, &hash, now).await?;

        let ttl = ttl_from_seconds(principal.claims.remaining_seconds_at(now));
        self.revocation
            .blacklist(&user.username, &principal.token, ttl)
            .await?;

        let report = self.logout_all(user).await?;
        info!(user_id = %user.id, revoked = report.revoked, "Password changed");
        Ok(report)
    }

    /// Mints and registers an access token and issues a refresh token.
    async fn open_session(&self, user: &User) -> AppResult<TokenPair> {
        let access = self.codec.mint(
            &user.username,
            Utc::now(),
            self.access_ttl,
            TokenType::Access,
        )?;
        self.revocation
            .register_active(&user.username, &access.token, self.access_ttl)
            .await?;

        let refresh = self.refresh_store.issue(user).await?;

        Ok(TokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
            token_type: "bearer".to_string(),
            access_token_expires_at: access.claims.expires_at(),
            refresh_token_expires_at: refresh.expires_at,
        })
    }
}
