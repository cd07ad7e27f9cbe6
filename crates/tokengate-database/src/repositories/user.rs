//! User repository.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use tokengate_core::error::{AppError, ErrorKind};
use tokengate_core::result::AppResult;
use tokengate_core::timeout::with_timeout;
use tokengate_entity::user::{CreateUser, UpdateProfile, User};

/// Persistence operations on user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync + std::fmt::Debug + 'static {
    /// Find a user by primary key.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find a user by exact username.
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Find a user by email (case-insensitive).
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Insert a new user. Duplicate username or email is a `Conflict`.
    async fn create(&self, data: &CreateUser) -> AppResult<User>;

    /// Update the self-service profile fields.
    async fn update_profile(&self, data: &UpdateProfile) -> AppResult<User>;

    /// Replace the password hash and record when it changed.
    async fn update_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Enable or disable the account.
    async fn set_active(&self, user_id: Uuid, active: bool) -> AppResult<()>;

    /// Mark the email address as confirmed.
    async fn mark_email_verified(&self, user_id: Uuid) -> AppResult<()>;
}

/// PostgreSQL-backed [`UserRepository`].
#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
    timeout: Duration,
}

impl PgUserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    fn expect_one_row(rows_affected: u64, user_id: Uuid) -> AppResult<()> {
        if rows_affected == 0 {
            return Err(AppError::not_found(format!("User {user_id} not found")));
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        with_timeout("users.find_by_id", self.timeout, async {
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to find user by id", e)
                })
        })
        .await
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        with_timeout("users.find_by_username", self.timeout, async {
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to find user by username", e)
                })
        })
        .await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        with_timeout("users.find_by_email", self.timeout, async {
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to find user by email", e)
                })
        })
        .await
    }

    async fn create(&self, data: &CreateUser) -> AppResult<User> {
        with_timeout("users.create", self.timeout, async {
            sqlx::query_as::<_, User>(
                "INSERT INTO users (id, username, email, password_hash, first_name, last_name, \
                                    phone_number, birth_date) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
                 RETURNING *",
            )
            .bind(Uuid::new_v4())
            .bind(&data.username)
            .bind(&data.email)
            .bind(&data.password_hash)
            .bind(&data.first_name)
            .bind(&data.last_name)
            .bind(&data.phone_number)
            .bind(data.birth_date)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err)
                    if db_err.constraint() == Some("users_username_key") =>
                {
                    AppError::conflict("username already used")
                }
                sqlx::Error::Database(ref db_err)
                    if db_err.constraint() == Some("users_email_key") =>
                {
                    AppError::conflict("email already used")
                }
                _ => AppError::with_source(ErrorKind::Database, "Failed to create user", e),
            })
        })
        .await
    }

    async fn update_profile(&self, data: &UpdateProfile) -> AppResult<User> {
        with_timeout("users.update_profile", self.timeout, async {
            sqlx::query_as::<_, User>(
                "UPDATE users SET first_name = COALESCE($2, first_name), \
                                  last_name = COALESCE($3, last_name), \
                                  phone_number = COALESCE($4, phone_number), \
                                  birth_date = COALESCE($5, birth_date), \
                                  updated_at = NOW() \
                 WHERE id = $1 RETURNING *",
            )
            .bind(data.id)
            .bind(&data.first_name)
            .bind(&data.last_name)
            .bind(&data.phone_number)
            .bind(data.birth_date)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update user", e))?
            .ok_or_else(|| AppError::not_found(format!("User {} not found", data.id)))
        })
        .await
    }

    async fn update_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> AppResult<()> {
        with_timeout("users.update_password", self.timeout, async {
            let result = sqlx::query(
                "UPDATE users SET password_hash = $2, last_password_change_at = $3, \
                                  updated_at = NOW() \
                 WHERE id = $1",
            )
            .bind(user_id)
            .bind(password_hash)
            .bind(changed_at)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update password", e))?;

            Self::expect_one_row(result.rows_affected(), user_id)
        })
        .await
    }

    async fn set_active(&self, user_id: Uuid, active: bool) -> AppResult<()> {
        with_timeout("users.set_active", self.timeout, async {
            let result =
                sqlx::query("UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1")
                    .bind(user_id)
                    .bind(active)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| {
                        AppError::with_source(ErrorKind::Database, "Failed to update status", e)
                    })?;

            Self::expect_one_row(result.rows_affected(), user_id)
        })
        .await
    }

    async fn mark_email_verified(&self, user_id: Uuid) -> AppResult<()> {
        with_timeout("users.mark_email_verified", self.timeout, async {
            let result = sqlx::query(
                "UPDATE users SET email_verified = TRUE, updated_at = NOW() WHERE id = $1",
            )
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to verify email", e)
            })?;

            Self::expect_one_row(result.rows_affected(), user_id)
        })
        .await
    }
}
