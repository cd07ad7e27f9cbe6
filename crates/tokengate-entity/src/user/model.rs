//! User entity model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Unique login name; also the subject of every token issued to the user.
    pub username: String,
    /// Unique email address.
    pub email: String,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Contact phone number.
    pub phone_number: Option<String>,
    /// Date of birth.
    pub birth_date: Option<NaiveDate>,
    /// Disabled accounts can neither log in nor use existing tokens.
    pub is_active: bool,
    /// Whether the email address has been confirmed.
    pub email_verified: bool,
    /// Tokens issued before this instant are stale.
    pub last_password_change_at: DateTime<Utc>,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
    /// When the row was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether a token issued at `issued_at` (seconds since epoch) predates
    /// the last credential change.
    ///
    /// The comparison is done at whole-second resolution because token
    /// timestamps carry no fractional part.
    pub fn is_token_stale(&self, issued_at: i64) -> bool {
        issued_at < self.last_password_change_at.timestamp()
    }
}

/// Data required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Desired username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Pre-hashed password.
    pub password_hash: String,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Contact phone number.
    pub phone_number: Option<String>,
    /// Date of birth.
    pub birth_date: Option<NaiveDate>,
}

/// Profile fields a user may change on their own account.
///
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfile {
    /// The user ID to update.
    pub id: Uuid,
    /// New given name.
    pub first_name: Option<String>,
    /// New family name.
    pub last_name: Option<String>,
    /// New phone number.
    pub phone_number: Option<String>,
    /// New date of birth.
    pub birth_date: Option<NaiveDate>,
}
