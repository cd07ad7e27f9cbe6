//! Revocation cache: `active` / `blacklisted` markers with TTL.
//!
//! An access token is only honoured while its key holds `active`. The key
//! moves to `blacklisted` on logout and never back; both values expire with
//! the token itself. A per-user index set lists every token registered for
//! the user so bulk revocation never scans the keyspace.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use tokengate_cache::CacheManager;
use tokengate_cache::keys;
use tokengate_core::error::{AppError, ErrorKind};
use tokengate_core::result::AppResult;
use tokengate_core::traits::CacheProvider;

use crate::jwt::codec::remaining_seconds_of;
use crate::jwt::{JwtCodec, fingerprint};

/// Cache value of a token that may be used.
const ACTIVE: &str = "active";
/// Cache value of a revoked token.
const BLACKLISTED: &str = "blacklisted";
/// Cache value of a redeemed email link.
const REDEEMED: &str = "redeemed";

/// Lifecycle state of one token in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// Registered and not revoked.
    Active,
    /// Revoked.
    Blacklisted,
    /// Never registered, or its entry has expired.
    Absent,
}

/// Outcome of [`RevocationCache::blacklist_all_for_user`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct RevocationReport {
    /// Tokens moved to `blacklisted`.
    pub revoked: usize,
    /// Tokens that were already blacklisted.
    pub already_blacklisted: usize,
    /// Expired, unparseable, or unregistered tokens dropped from the index.
    pub skipped: usize,
    /// Tokens that could not be blacklisted even after a retry.
    pub failed: usize,
}

/// Converts a remaining lifetime into a cache TTL: rounded up, at least 1s.
pub fn ttl_from_seconds(seconds: f64) -> Duration {
    let secs = seconds.ceil();
    if secs.is_finite() && secs >= 1.0 {
        Duration::from_secs(secs as u64)
    } else {
        Duration::from_secs(1)
    }
}

/// Records and answers the revocation state of access tokens.
#[derive(Debug, Clone)]
pub struct RevocationCache {
    /// Backing store.
    cache: Arc<CacheManager>,
    /// Decodes indexed tokens to find their remaining lifetime.
    codec: Arc<JwtCodec>,
}

impl RevocationCache {
    /// Creates a revocation cache over the given store.
    pub fn new(cache: Arc<CacheManager>, codec: Arc<JwtCodec>) -> Self {
        Self { cache, codec }
    }

    /// Marks a token `active` for `ttl` and adds it to the user's index.
    ///
    /// Returns `false` without writing when the token is already blacklisted:
    /// a revoked token is never resurrected.
    pub async fn register_active(
        &self,
        username: &str,
        token: &str,
        ttl: Duration,
    ) -> AppResult<bool> {
        let key = keys::user_token(username, token);
        let written = self.cache.set_unless(&key, ACTIVE, BLACKLISTED, ttl).await?;
        if !written {
            warn!(
                username = %username,
                token = %fingerprint(token),
                "Refusing to re-activate a blacklisted token"
            );
            return Ok(false);
        }

        self.cache
            .set_add(&keys::user_token_index(username), token, ttl)
            .await?;

        debug!(username = %username, token = %fingerprint(token), "Token registered");
        Ok(true)
    }

    /// Overwrites the token's entry with `blacklisted` for `ttl`.
    ///
    /// A single atomic write, so a concurrent registration cannot interleave.
    pub async fn blacklist(&self, username: &str, token: &str, ttl: Duration) -> AppResult<bool> {
        self.cache
            .set(&keys::user_token(username, token), BLACKLISTED, ttl)
            .await?;

        debug!(username = %username, token = %fingerprint(token), "Token blacklisted");
        Ok(true)
    }

    /// Reads the token's state in one round-trip.
    pub async fn state(&self, username: &str, token: &str) -> AppResult<TokenState> {
        let value = self.cache.get(&keys::user_token(username, token)).await?;
        Ok(match value.as_deref() {
            Some(ACTIVE) => TokenState::Active,
            Some(BLACKLISTED) => TokenState::Blacklisted,
            Some(other) => {
                warn!(username = %username, value = %other, "Unexpected revocation cache value");
                TokenState::Absent
            }
            None => TokenState::Absent,
        })
    }

    /// Whether the token is registered and not revoked. Absent means `false`.
    pub async fn is_active(&self, username: &str, token: &str) -> AppResult<bool> {
        Ok(self.state(username, token).await? == TokenState::Active)
    }

    /// Whether the token has been revoked. Absent means `false`.
    pub async fn is_blacklisted(&self, username: &str, token: &str) -> AppResult<bool> {
        Ok(self.state(username, token).await? == TokenState::Blacklisted)
    }

    /// Blacklists every outstanding token registered for `username`.
    ///
    /// Each key is revoked on its own; a key that fails is retried once and
    /// then counted in [`RevocationReport::failed`]. Only when every attempted
    /// key fails does the call return an error.
    pub async fn blacklist_all_for_user(&self, username: &str) -> AppResult<RevocationReport> {
        let index = keys::user_token_index(username);
        let tokens = self.cache.set_members(&index).await?;
        let mut report = RevocationReport::default();
        let mut attempted = 0usize;

        for token in tokens {
            let remaining = match self
                .codec
                .decode(&token)
                .and_then(|claims| remaining_seconds_of(&claims))
            {
                Ok(remaining) => remaining,
                Err(e) => {
                    debug!(
                        username = %username,
                        token = %fingerprint(&token),
                        reason = %e.kind,
                        "Skipping unusable indexed token"
                    );
                    report.skipped += 1;
                    self.prune(&index, &token).await;
                    continue;
                }
            };

            match self.state(username, &token).await {
                Ok(TokenState::Blacklisted) => {
                    report.already_blacklisted += 1;
                    continue;
                }
                Ok(TokenState::Absent) => {
                    report.skipped += 1;
                    self.prune(&index, &token).await;
                    continue;
                }
                Ok(TokenState::Active) => {}
                Err(e) => {
                    warn!(
                        username = %username,
                        token = %fingerprint(&token),
                        error = %e,
                        "State lookup failed; blacklisting anyway"
                    );
                }
            }

            attempted += 1;
            let ttl = ttl_from_seconds(remaining);
            if self.blacklist_with_retry(username, &token, ttl).await {
                report.revoked += 1;
            } else {
                report.failed += 1;
            }
        }

        if attempted > 0 && report.failed == attempted {
            return Err(AppError::new(
                ErrorKind::Cache,
                format!("Failed to revoke any of {attempted} sessions for {username}"),
            ));
        }

        info!(
            username = %username,
            revoked = report.revoked,
            already_blacklisted = report.already_blacklisted,
            skipped = report.skipped,
            failed = report.failed,
            "Revoked all sessions for user"
        );
        Ok(report)
    }

    async fn blacklist_with_retry(&self, username: &str, token: &str, ttl: Duration) -> bool {
        for attempt in 1..=2 {
            match self.blacklist(username, token, ttl).await {
                Ok(_) => return true,
                Err(e) => warn!(
                    username = %username,
                    token = %fingerprint(token),
                    attempt,
                    error = %e,
                    "Failed to blacklist token"
                ),
            }
        }
        false
    }

    /// Marks an email link as used until it expires.
    ///
    /// Returns `false` when the link was redeemed before. The check and the
    /// write are one atomic step, so two concurrent redemptions cannot both
    /// succeed.
    pub async fn redeem_link(&self, link_id: &str, remaining_seconds: f64) -> AppResult<bool> {
        let ttl = ttl_from_seconds(remaining_seconds);
        let first = self
            .cache
            .set_unless(&keys::used_link(link_id), REDEEMED, REDEEMED, ttl)
            .await?;
        if !first {
            warn!(link = %link_id, "Link presented again after redemption");
        }
        Ok(first)
    }

    async fn prune(&self, index: &str, token: &str) {
        if let Err(e) = self.cache.set_remove(index, token).await {
            debug!(index = %index, error = %e, "Failed to prune token index");
        }
    }
}
