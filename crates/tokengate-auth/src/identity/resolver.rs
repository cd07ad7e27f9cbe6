//! The single gate every protected operation goes through.

use std::sync::Arc;

use tracing::debug;

use tokengate_core::error::{AppError, ErrorKind};
use tokengate_core::result::AppResult;
use tokengate_database::UserRepository;
use tokengate_entity::user::User;

use crate::jwt::{Claims, JwtCodec, fingerprint};
use crate::revocation::{RevocationCache, TokenState};

/// An authenticated caller.
#[derive(Debug, Clone)]
pub struct Principal {
    /// The user record as loaded for this request.
    pub user: User,
    /// Claims of the presented access token.
    pub claims: Claims,
    /// The presented access token.
    pub token: String,
}

/// Resolves an access token into a [`Principal`].
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    codec: Arc<JwtCodec>,
    revocation: Arc<RevocationCache>,
    user_repo: Arc<dyn UserRepository>,
}

impl IdentityResolver {
    /// Creates a resolver.
    pub fn new(
        codec: Arc<JwtCodec>,
        revocation: Arc<RevocationCache>,
        user_repo: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            codec,
            revocation,
            user_repo,
        }
    }

    /// Checks, in order, and stops at the first failure:
    ///
    /// 1. signature and expiry (`TokenInvalid` / `TokenExpired`)
    /// 2. `sub` and `iat` present (`TokenInvalid`)
    /// 3. revocation state is `active` (`Unauthenticated`)
    /// 4. the subject exists (`BadRequest`)
    /// 5. the account is active (`Unauthenticated`)
    /// 6. the token postdates the last password change (`TokenExpired`)
    pub async fn resolve(&self, token: &str) -> AppResult<Principal> {
        let claims = self.codec.decode(token).map_err(|e| match e.kind {
            ErrorKind::TokenMalformed => AppError::token_invalid(e.message),
            _ => e,
        })?;

        match self.revocation.state(&claims.sub, token).await? {
            TokenState::Active => {}
            TokenState::Blacklisted => {
                debug!(username = %claims.sub, token = %fingerprint(token), "Revoked token presented");
                return Err(AppError::unauthenticated("Token has been revoked"));
            }
            TokenState::Absent => {
                debug!(username = %claims.sub, token = %fingerprint(token), "Unregistered token presented");
                return Err(AppError::unauthenticated("Token is not active"));
            }
        }

        let user = self
            .user_repo
            .find_by_username(&claims.sub)
            .await?
            .ok_or_else(|| AppError::bad_request("User not found"))?;

        if !user.is_active {
            return Err(AppError::unauthenticated("Account is deactivated"));
        }

        if user.is_token_stale(claims.iat) {
            return Err(AppError::token_expired(
                "Token was issued before the last password change",
            ));
        }

        Ok(Principal {
            user,
            claims,
            token: token.to_string(),
        })
    }
}
