//! Refresh token row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted refresh token. Rows are deactivated, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshToken {
    /// Row identifier.
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// The signed token value (unique).
    pub token: String,
    /// Whether the token may still be exchanged.
    pub is_active: bool,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the embedded token expires.
    pub expires_at: DateTime<Utc>,
}

impl RefreshToken {
    /// Whether the row can still be exchanged at `now`.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at > now
    }
}

/// Data required to persist a freshly minted refresh token.
#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    /// Owning user.
    pub user_id: Uuid,
    /// The signed token value.
    pub token: String,
    /// When the embedded token expires.
    pub expires_at: DateTime<Utc>,
}
