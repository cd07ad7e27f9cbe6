//! Purpose-bound, expiring link tokens.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tokengate_core::config::AuthConfig;
use tokengate_core::error::{AppError, ErrorKind};
use tokengate_core::result::AppResult;

/// What a link may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkPurpose {
    /// Set a new password without knowing the old one.
    ResetPassword,
    /// Confirm ownership of the email address.
    AccountVerification,
}

impl LinkPurpose {
    /// Path segment and claim value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResetPassword => "reset-password",
            Self::AccountVerification => "account-verification",
        }
    }
}

/// What a verified link proves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedLink {
    /// The address the link was sent to.
    pub email: String,
    /// When the link was signed (seconds since epoch).
    pub issued_at: i64,
    /// When the link stops verifying (seconds since epoch).
    pub expires_at: i64,
    /// Unique id of this link, used to redeem it once.
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct LinkClaims {
    sub: String,
    purpose: String,
    iat: i64,
    exp: i64,
    jti: String,
}

/// Signs and verifies email links with the service's HMAC key.
#[derive(Clone)]
pub struct LinkSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    /// Front-end base URL the links point at.
    base_url: String,
    /// Link lifetime in seconds.
    max_age_seconds: i64,
}

impl std::fmt::Debug for LinkSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkSigner")
            .field("base_url", &self.base_url)
            .field("max_age_seconds", &self.max_age_seconds)
            .finish()
    }
}

impl LinkSigner {
    /// Creates a signer for links under `base_url`.
    pub fn new(config: &AuthConfig, base_url: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_age_seconds: config.link_max_age_seconds as i64,
        }
    }

    /// Signs `email` for `purpose`.
    pub fn sign(&self, email: &str, purpose: LinkPurpose) -> AppResult<String> {
        let iat = Utc::now().timestamp();
        let claims = LinkClaims {
            sub: email.to_string(),
            purpose: purpose.as_str().to_string(),
            iat,
            exp: iat + self.max_age_seconds,
            jti: Uuid::new_v4().to_string(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Failed to sign link", e))
    }

    /// Full link: `{base_url}/{purpose}?token=...`.
    pub fn link(&self, email: &str, purpose: LinkPurpose) -> AppResult<String> {
        let token = self.sign(email, purpose)?;
        Ok(format!("{}/{}?token={}", self.base_url, purpose.as_str(), token))
    }

    /// Checks the link and returns who it was issued for.
    ///
    /// Any failure (bad signature, expired, other purpose) is `BadRequest`.
    pub fn verify(&self, token: &str, purpose: LinkPurpose) -> AppResult<VerifiedLink> {
        let data =
            decode::<LinkClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    JwtErrorKind::ExpiredSignature => AppError::bad_request("Link has expired"),
                    _ => AppError::bad_request("Invalid link"),
                }
            })?;

        if data.claims.purpose != purpose.as_str() {
            return Err(AppError::bad_request("Invalid link"));
        }
        Ok(VerifiedLink {
            email: data.claims.sub,
            issued_at: data.claims.iat,
            expires_at: data.claims.exp,
            id: data.claims.jti,
        })
    }
}
