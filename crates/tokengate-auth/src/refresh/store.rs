//! Refresh token issuance, validation, and the per-user active cap.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use tokengate_core::config::AuthConfig;
use tokengate_core::error::AppError;
use tokengate_core::result::AppResult;
use tokengate_database::RefreshTokenRepository;
use tokengate_entity::token::{NewRefreshToken, RefreshToken};
use tokengate_entity::user::User;

use crate::jwt::{JwtCodec, TokenType};

/// Issues and validates refresh tokens.
///
/// The cap on active rows is enforced after every insert by deactivating the
/// oldest excess rows. The read-then-update is not serialized, so a burst of
/// concurrent logins may briefly leave more than `max_active` rows active;
/// the next issuance corrects it.
#[derive(Debug, Clone)]
pub struct RefreshTokenStore {
    /// Row persistence.
    repo: Arc<dyn RefreshTokenRepository>,
    /// Mints the token values.
    codec: Arc<JwtCodec>,
    /// Lifetime of a new refresh token.
    ttl: Duration,
    /// Maximum simultaneously active rows per user.
    max_active: i64,
}

impl RefreshTokenStore {
    /// Creates a store from auth configuration.
    pub fn new(
        repo: Arc<dyn RefreshTokenRepository>,
        codec: Arc<JwtCodec>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            repo,
            codec,
            ttl: Duration::from_secs(config.refresh_token_ttl_seconds),
            max_active: config.max_active_refresh_tokens,
        }
    }

    /// Mints and persists a new refresh token for `user`, then trims the
    /// user's active rows down to the cap.
    pub async fn issue(&self, user: &User) -> AppResult<RefreshToken> {
        let minted = self
            .codec
            .mint(&user.username, Utc::now(), self.ttl, TokenType::Refresh)?;

        let row = self
            .repo
            .create(&NewRefreshToken {
                user_id: user.id,
                token: minted.token,
                expires_at: minted.claims.expires_at(),
            })
            .await?;

        let evicted = self.enforce_cap(user.id).await?;
        debug!(user_id = %user.id, evicted, "Refresh token issued");
        Ok(row)
    }

    /// Deactivates the oldest active rows beyond the cap. Returns how many
    /// rows were deactivated.
    pub async fn enforce_cap(&self, user_id: Uuid) -> AppResult<u64> {
        let active = self.repo.list_active_by_user(user_id).await?;
        let excess = active.len() as i64 - self.max_active;
        if excess <= 0 {
            return Ok(0);
        }

        let oldest: Vec<Uuid> = active
            .iter()
            .take(excess as usize)
            .map(|row| row.id)
            .collect();
        let evicted = self.repo.deactivate(&oldest).await?;
        info!(user_id = %user_id, evicted, "Evicted oldest refresh tokens over the cap");
        Ok(evicted)
    }

    /// Looks up the row for `token`.
    ///
    /// Fails with `TokenExpired` if no row matches, or the row is inactive or
    /// past its expiry.
    pub async fn validate(&self, token: &str) -> AppResult<RefreshToken> {
        let row = self
            .repo
            .find_by_token(token)
            .await?
            .ok_or_else(|| AppError::token_expired("Refresh token is not recognised"))?;

        if !row.is_usable_at(Utc::now()) {
            return Err(AppError::token_expired("Refresh token is no longer active"));
        }
        Ok(row)
    }

    /// Deactivates a validated row so it cannot be exchanged again.
    ///
    /// Loses with `TokenExpired` if a concurrent caller consumed it first.
    pub async fn consume(&self, row: &RefreshToken) -> AppResult<()> {
        if !self.repo.deactivate_if_active(row.id).await? {
            return Err(AppError::token_expired("Refresh token has already been used"));
        }
        Ok(())
    }

    /// Deactivates every refresh token of the user.
    pub async fn deactivate_all(&self, user_id: Uuid) -> AppResult<u64> {
        let changed = self.repo.deactivate_all_for_user(user_id).await?;
        info!(user_id = %user_id, changed, "Deactivated all refresh tokens");
        Ok(changed)
    }

    /// Active rows of the user, oldest first.
    pub async fn active_for_user(&self, user_id: Uuid) -> AppResult<Vec<RefreshToken>> {
        self.repo.list_active_by_user(user_id).await
    }
}
