//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use tokengate_auth::{IdentityResolver, SessionManager};
use tokengate_cache::CacheManager;
use tokengate_core::config::AppConfig;
use tokengate_database::DatabasePool;
use tokengate_service::{RecoveryService, UserService};

use crate::middleware::rate_limit::RateLimiter;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// PostgreSQL pool, `None` when running on the in-memory store
    pub db_pool: Option<DatabasePool>,
    /// Cache manager (Redis or in-memory)
    pub cache: Arc<CacheManager>,

    // ── Auth ─────────────────────────────────────────────────
    /// Bearer token to principal
    pub resolver: Arc<IdentityResolver>,
    /// Login, refresh, logout, password change
    pub session_manager: Arc<SessionManager>,

    // ── Services ─────────────────────────────────────────────
    /// Registration and self-service account operations
    pub user_service: Arc<UserService>,
    /// Password reset and email verification
    pub recovery_service: Arc<RecoveryService>,

    // ── Middleware ───────────────────────────────────────────
    /// Per-client throttling of the auth routes
    pub rate_limiter: Option<RateLimiter>,
}
