//! HS256 token minting and verification.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use tokengate_core::config::AuthConfig;
use tokengate_core::error::{AppError, ErrorKind};
use tokengate_core::result::AppResult;

use super::claims::{Claims, RawClaims, TokenType};

/// A freshly minted token and the claims it carries.
#[derive(Debug, Clone)]
pub struct MintedToken {
    /// The compact signed token.
    pub token: String,
    /// Its payload.
    pub claims: Claims,
}

/// Signs and verifies tokens with a shared HMAC secret.
#[derive(Clone)]
pub struct JwtCodec {
    /// HMAC key for signing.
    encoding_key: EncodingKey,
    /// HMAC key for verification.
    decoding_key: DecodingKey,
    /// Validation rules (algorithm, expiry, no leeway).
    validation: Validation,
}

impl std::fmt::Debug for JwtCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtCodec")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtCodec {
    /// Creates a codec for the given secret.
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Creates a codec from auth configuration.
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.jwt_secret)
    }

    /// Signs `claims`. The same claims always produce the same token.
    pub fn encode(&self, claims: &Claims) -> AppResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Failed to sign token", e))
    }

    /// Mints a token for `subject` issued at `issued_at` and valid for `ttl`.
    pub fn mint(
        &self,
        subject: &str,
        issued_at: DateTime<Utc>,
        ttl: Duration,
        typ: TokenType,
    ) -> AppResult<MintedToken> {
        let iat = issued_at.timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            iat,
            exp: iat.saturating_add(ttl.as_secs() as i64),
            jti: Uuid::new_v4(),
            typ,
        };
        let token = self.encode(&claims)?;
        Ok(MintedToken { token, claims })
    }

    /// Verifies signature and expiry and returns the claims.
    ///
    /// - bad signature or structure: [`ErrorKind::TokenInvalid`]
    /// - expiry passed: [`ErrorKind::TokenExpired`]
    /// - verified but missing `sub`/`iat`: [`ErrorKind::TokenMalformed`]
    pub fn decode(&self, token: &str) -> AppResult<Claims> {
        let data = decode::<RawClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                JwtErrorKind::ExpiredSignature => AppError::token_expired("Token has expired"),
                JwtErrorKind::MissingRequiredClaim(claim) => {
                    AppError::token_malformed(format!("Token is missing the {claim} claim"))
                }
                JwtErrorKind::Json(_) => AppError::token_malformed("Token claims are malformed"),
                JwtErrorKind::InvalidSignature => {
                    AppError::token_invalid("Invalid token signature")
                }
                _ => AppError::token_invalid("Invalid token"),
            },
        )?;

        Claims::try_from(data.claims)
    }

    /// Seconds until the token expires, with sub-second precision.
    ///
    /// Fails with [`ErrorKind::TokenExpired`] once nothing remains.
    pub fn remaining_seconds(&self, token: &str) -> AppResult<f64> {
        let claims = self.decode(token)?;
        remaining_seconds_of(&claims)
    }
}

/// Remaining lifetime of already verified claims.
pub(crate) fn remaining_seconds_of(claims: &Claims) -> AppResult<f64> {
    let remaining = claims.remaining_seconds_at(Utc::now());
    if remaining <= 0.0 {
        return Err(AppError::token_expired("Token has expired"));
    }
    Ok(remaining)
}

/// Short, non-reversible identifier of a token for log lines.
pub fn fingerprint(token: &str) -> String {
    Sha256::digest(token.as_bytes())
        .iter()
        .take(6)
        .map(|b| format!("{b:02x}"))
        .collect()
}
