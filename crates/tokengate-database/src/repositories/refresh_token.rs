//! Refresh token repository.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use tokengate_core::error::{AppError, ErrorKind};
use tokengate_core::result::AppResult;
use tokengate_core::timeout::with_timeout;
use tokengate_entity::token::{NewRefreshToken, RefreshToken};

/// Persistence operations on refresh token rows.
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a new active row.
    async fn create(&self, data: &NewRefreshToken) -> AppResult<RefreshToken>;

    /// Find the row holding exactly this token value.
    async fn find_by_token(&self, token: &str) -> AppResult<Option<RefreshToken>>;

    /// All active rows of a user, oldest first.
    async fn list_active_by_user(&self, user_id: Uuid) -> AppResult<Vec<RefreshToken>>;

    /// Deactivate the given rows. Returns the number of rows changed.
    async fn deactivate(&self, ids: &[Uuid]) -> AppResult<u64>;

    /// Deactivate one row if it is still active.
    ///
    /// Returns `false` when another caller got there first.
    async fn deactivate_if_active(&self, id: Uuid) -> AppResult<bool>;

    /// Deactivate every row of a user. Returns the number of rows changed.
    async fn deactivate_all_for_user(&self, user_id: Uuid) -> AppResult<u64>;
}

/// PostgreSQL-backed [`RefreshTokenRepository`].
#[derive(Debug, Clone)]
pub struct PgRefreshTokenRepository {
    pool: PgPool,
    timeout: Duration,
}

impl PgRefreshTokenRepository {
    /// Create a new refresh token repository.
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl RefreshTokenRepository for PgRefreshTokenRepository {
    async fn create(&self, data: &NewRefreshToken) -> AppResult<RefreshToken> {
        with_timeout("refresh_tokens.create", self.timeout, async {
            sqlx::query_as::<_, RefreshToken>(
                "INSERT INTO refresh_tokens (id, user_id, token, is_active, expires_at) \
                 VALUES ($1, $2, $3, TRUE, $4) \
                 RETURNING *",
            )
            .bind(Uuid::new_v4())
            .bind(data.user_id)
            .bind(&data.token)
            .bind(data.expires_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err)
                    if db_err.constraint() == Some("refresh_tokens_token_key") =>
                {
                    AppError::conflict("Refresh token already issued")
                }
                _ => AppError::with_source(
                    ErrorKind::Database,
                    "Failed to store refresh token",
                    e,
                ),
            })
        })
        .await
    }

    async fn find_by_token(&self, token: &str) -> AppResult<Option<RefreshToken>> {
        with_timeout("refresh_tokens.find_by_token", self.timeout, async {
            sqlx::query_as::<_, RefreshToken>("SELECT * FROM refresh_tokens WHERE token = $1")
                .bind(token)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to find refresh token", e)
                })
        })
        .await
    }

    async fn list_active_by_user(&self, user_id: Uuid) -> AppResult<Vec<RefreshToken>> {
        with_timeout("refresh_tokens.list_active_by_user", self.timeout, async {
            sqlx::query_as::<_, RefreshToken>(
                "SELECT * FROM refresh_tokens WHERE user_id = $1 AND is_active \
                 ORDER BY created_at ASC, id ASC",
            )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to list refresh tokens", e)
            })
        })
        .await
    }

    async fn deactivate(&self, ids: &[Uuid]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        with_timeout("refresh_tokens.deactivate", self.timeout, async {
            sqlx::query("UPDATE refresh_tokens SET is_active = FALSE WHERE id = ANY($1)")
                .bind(ids.to_vec())
                .execute(&self.pool)
                .await
                .map(|r| r.rows_affected())
                .map_err(|e| {
                    AppError::with_source(
                        ErrorKind::Database,
                        "Failed to deactivate refresh tokens",
                        e,
                    )
                })
        })
        .await
    }

    async fn deactivate_if_active(&self, id: Uuid) -> AppResult<bool> {
        with_timeout("refresh_tokens.deactivate_if_active", self.timeout, async {
            sqlx::query("UPDATE refresh_tokens SET is_active = FALSE WHERE id = $1 AND is_active")
                .bind(id)
                .execute(&self.pool)
                .await
                .map(|r| r.rows_affected() == 1)
                .map_err(|e| {
                    AppError::with_source(
                        ErrorKind::Database,
                        "Failed to consume refresh token",
                        e,
                    )
                })
        })
        .await
    }

    async fn deactivate_all_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        with_timeout("refresh_tokens.deactivate_all_for_user", self.timeout, async {
            sqlx::query(
                "UPDATE refresh_tokens SET is_active = FALSE WHERE user_id = $1 AND is_active",
            )
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected())
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    "Failed to deactivate refresh tokens",
                    e,
                )
            })
        })
        .await
    }
}
