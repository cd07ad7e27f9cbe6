//! Claims carried by every token this service mints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tokengate_core::error::AppError;

/// Distinguishes access tokens from refresh tokens.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Bearer credential presented on every request.
    #[default]
    Access,
    /// Long-lived credential exchanged for a new access token.
    Refresh,
}

/// Verified token payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject: the username.
    pub sub: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Unique token ID, so two tokens minted in the same second differ.
    pub jti: Uuid,
    /// Token type.
    #[serde(default)]
    pub typ: TokenType,
}

/// Wire form used while decoding, before required claims are checked.
#[derive(Debug, Deserialize)]
pub(crate) struct RawClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub iat: Option<i64>,
    pub exp: i64,
    #[serde(default)]
    pub jti: Option<Uuid>,
    #[serde(default)]
    pub typ: TokenType,
}

impl TryFrom<RawClaims> for Claims {
    type Error = AppError;

    fn try_from(raw: RawClaims) -> Result<Self, Self::Error> {
        let sub = raw
            .sub
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::token_malformed("Token is missing the subject claim"))?;
        let iat = raw
            .iat
            .ok_or_else(|| AppError::token_malformed("Token is missing the issued-at claim"))?;

        Ok(Self {
            sub,
            iat,
            exp: raw.exp,
            jti: raw.jti.unwrap_or_default(),
            typ: raw.typ,
        })
    }
}

impl Claims {
    /// The issue instant.
    pub fn issued_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.iat, 0).unwrap_or_default()
    }

    /// The expiry instant.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_default()
    }

    /// Seconds until expiry measured from `now`, with sub-second precision.
    /// Zero or negative once the token has expired.
    pub fn remaining_seconds_at(&self, now: DateTime<Utc>) -> f64 {
        self.exp as f64 - now.timestamp_millis() as f64 / 1000.0
    }
}
