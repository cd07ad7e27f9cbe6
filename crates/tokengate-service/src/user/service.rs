//! Registration and self-service account operations.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};

use tokengate_auth::{PasswordHasher, PasswordValidator, SessionManager};
use tokengate_core::error::AppError;
use tokengate_core::result::AppResult;
use tokengate_database::UserRepository;
use tokengate_entity::user::{CreateUser, UpdateProfile, User};

/// Data for creating an account.
#[derive(Debug, Clone)]
pub struct Registration {
    /// Desired username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Plaintext password.
    pub password: String,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Contact phone number.
    pub phone_number: Option<String>,
    /// Date of birth.
    pub birth_date: Option<NaiveDate>,
}

/// Handles registration and the authenticated user's own account.
#[derive(Debug, Clone)]
pub struct UserService {
    /// User repository.
    user_repo: Arc<dyn UserRepository>,
    /// Password hasher.
    hasher: Arc<PasswordHasher>,
    /// Password validator.
    validator: Arc<PasswordValidator>,
    /// Revokes sessions when the account is deactivated.
    sessions: Arc<SessionManager>,
}

impl UserService {
    /// Creates a new user service.
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        hasher: Arc<PasswordHasher>,
        validator: Arc<PasswordValidator>,
        sessions: Arc<SessionManager>,
    ) -> Self {
        Self {
            user_repo,
            hasher,
            validator,
            sessions,
        }
    }

    /// Creates an account.
    ///
    /// A taken username or email is a `Conflict` naming which one is taken.
    pub async fn register(&self, registration: Registration) -> AppResult<User> {
        let username_taken = self
            .user_repo
            .find_by_username(&registration.username)
            .await?
            .is_some();
        let email_taken = self
            .user_repo
            .find_by_email(&registration.email)
            .await?
            .is_some();

        match (username_taken, email_taken) {
            (true, true) => return Err(AppError::conflict("username and email already used")),
            (true, false) => return Err(AppError::conflict("username already used")),
            (false, true) => return Err(AppError::conflict("email already used")),
            (false, false) => {}
        }

        self.validator.validate(
            &registration.password,
            &[&registration.username, &registration.email],
        )?;
        let password_hash = self.hasher.hash(&registration.password).await?;

        let user = self
            .user_repo
            .create(&CreateUser {
                username: registration.username,
                email: registration.email,
                password_hash,
                first_name: registration.first_name,
                last_name: registration.last_name,
                phone_number: registration.phone_number,
                birth_date: registration.birth_date,
            })
            .await?;

        info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Updates the profile fields that are `Some` in `changes`.
    pub async fn update_profile(&self, user: &User, changes: UpdateProfile) -> AppResult<User> {
        let updated = self
            .user_repo
            .update_profile(&UpdateProfile {
                id: user.id,
                ..changes
            })
            .await?;

        info!(user_id = %user.id, "Profile updated");
        Ok(updated)
    }

    /// Disables the account and revokes every session.
    ///
    /// Returns `false` if the account was already disabled.
    pub async fn deactivate_account(&self, user: &User) -> AppResult<bool> {
        let current = self
            .user_repo
            .find_by_id(user.id)
            .await?
            .ok_or_else(|| AppError::bad_request("User not found"))?;
        if !current.is_active {
            info!(user_id = %user.id, "Account already deactivated");
            return Ok(false);
        }

        self.user_repo.set_active(user.id, false).await?;

        // A disabled account already fails every token check.
        if let Err(e) = self.sessions.logout_all(&current).await {
            warn!(user_id = %user.id, error = %e, "Failed to revoke sessions of deactivated account");
        }

        info!(user_id = %user.id, "Account deactivated");
        Ok(true)
    }
}
