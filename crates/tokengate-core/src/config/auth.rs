//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Token lifetimes, refresh-token policy, and credential hashing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for HMAC-SHA256 token signing.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Access token lifetime in seconds.
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_seconds: u64,
    /// Refresh token lifetime in seconds.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl_seconds: u64,
    /// Maximum simultaneously active refresh tokens per user.
    #[serde(default = "default_max_active")]
    pub max_active_refresh_tokens: i64,
    /// Deactivate a refresh token as soon as it is exchanged.
    #[serde(default = "default_true")]
    pub rotate_refresh_tokens: bool,
    /// Minimum password length.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Require a zxcvbn strength score of at least this value (0-4).
    #[serde(default = "default_password_score")]
    pub password_min_score: u8,
    /// Argon2 memory cost in KiB.
    #[serde(default = "default_argon_memory")]
    pub argon2_memory_kib: u32,
    /// Argon2 iteration count.
    #[serde(default = "default_argon_iterations")]
    pub argon2_iterations: u32,
    /// Deadline for a single hash or verify call, in milliseconds.
    #[serde(default = "default_credential_timeout")]
    pub credential_timeout_ms: u64,
    /// Lifetime of password-reset and verification links in seconds.
    #[serde(default = "default_link_max_age")]
    pub link_max_age_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            access_token_ttl_seconds: default_access_ttl(),
            refresh_token_ttl_seconds: default_refresh_ttl(),
            max_active_refresh_tokens: default_max_active(),
            rotate_refresh_tokens: default_true(),
            password_min_length: default_password_min(),
            password_min_score: default_password_score(),
            argon2_memory_kib: default_argon_memory(),
            argon2_iterations: default_argon_iterations(),
            credential_timeout_ms: default_credential_timeout(),
            link_max_age_seconds: default_link_max_age(),
        }
    }
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_access_ttl() -> u64 {
    24 * 60 * 60
}

fn default_refresh_ttl() -> u64 {
    7 * 24 * 60 * 60
}

fn default_max_active() -> i64 {
    3
}

fn default_true() -> bool {
    true
}

fn default_password_min() -> usize {
    8
}

fn default_password_score() -> u8 {
    2
}

fn default_argon_memory() -> u32 {
    19 * 1024
}

fn default_argon_iterations() -> u32 {
    2
}

fn default_credential_timeout() -> u64 {
    5000
}

fn default_link_max_age() -> u64 {
    10800
}
