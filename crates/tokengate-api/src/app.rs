//! Application builder: wires components into state and state into an
//! Axum app.

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use tower_http::compression::CompressionLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tokio::sync::watch;
use tracing::{info, warn};

use tokengate_auth::{
    IdentityResolver, JwtCodec, LinkSigner, PasswordHasher, PasswordValidator, RefreshTokenStore,
    RevocationCache, SessionManager,
};
use tokengate_cache::CacheManager;
use tokengate_core::config::AppConfig;
use tokengate_core::error::{AppError, ErrorKind};
use tokengate_core::result::AppResult;
use tokengate_core::traits::Mailer;
use tokengate_database::{DatabasePool, RefreshTokenRepository, UserRepository};
use tokengate_service::{MailDispatcher, RecoveryService, UserService};

use crate::middleware::cors::build_cors_layer;
use crate::middleware::rate_limit::RateLimiter;
use crate::router::build_router;
use crate::state::AppState;

/// Request bodies above this size are rejected.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Externally constructed infrastructure the application runs on.
#[derive(Debug, Clone)]
pub struct Backends {
    /// User persistence.
    pub user_repo: Arc<dyn UserRepository>,
    /// Refresh token persistence.
    pub refresh_repo: Arc<dyn RefreshTokenRepository>,
    /// Token state cache.
    pub cache: Arc<CacheManager>,
    /// Outbound mail transport.
    pub mailer: Arc<dyn Mailer>,
    /// PostgreSQL pool for health checks, if one is used.
    pub db_pool: Option<DatabasePool>,
}

/// Builds every component from configuration and the given backends.
pub fn build_state(config: AppConfig, backends: Backends) -> AppResult<AppState> {
    let auth = &config.auth;

    let codec = Arc::new(JwtCodec::from_config(auth));
    let revocation = Arc::new(RevocationCache::new(
        Arc::clone(&backends.cache),
        Arc::clone(&codec),
    ));
    let refresh_store = Arc::new(RefreshTokenStore::new(
        Arc::clone(&backends.refresh_repo),
        Arc::clone(&codec),
        auth,
    ));
    let password_hasher = Arc::new(PasswordHasher::new(auth)?);
    let password_validator = Arc::new(PasswordValidator::new(auth));

    let session_manager = Arc::new(SessionManager::new(
        Arc::clone(&codec),
        Arc::clone(&revocation),
        Arc::clone(&refresh_store),
        Arc::clone(&backends.user_repo),
        Arc::clone(&password_hasher),
        Arc::clone(&password_validator),
        auth,
    ));
    let resolver = Arc::new(IdentityResolver::new(
        Arc::clone(&codec),
        Arc::clone(&revocation),
        Arc::clone(&backends.user_repo),
    ));

    let user_service = Arc::new(UserService::new(
        Arc::clone(&backends.user_repo),
        Arc::clone(&password_hasher),
        Arc::clone(&password_validator),
        Arc::clone(&session_manager),
    ));
    let links = Arc::new(LinkSigner::new(auth, &config.mail.base_url));
    let recovery_service = Arc::new(RecoveryService::new(
        Arc::clone(&backends.user_repo),
        Arc::clone(&password_hasher),
        Arc::clone(&password_validator),
        links,
        Arc::clone(&session_manager),
        Arc::clone(&revocation),
        MailDispatcher::new(Arc::clone(&backends.mailer)),
    ));

    let rate_limiter = RateLimiter::from_config(&config.rate_limit);

    Ok(AppState {
        config: Arc::new(config),
        db_pool: backends.db_pool,
        cache: backends.cache,
        resolver,
        session_manager,
        user_service,
        recovery_service,
        rate_limiter,
    })
}

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);
    let request_timeout = Duration::from_secs(state.config.server.request_timeout_seconds);

    build_router(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Binds the configured address and serves until Ctrl+C or SIGTERM.
///
/// In-flight requests get `server.shutdown_grace_seconds` to finish once the
/// signal arrives.
pub async fn serve(state: AppState) -> AppResult<()> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let grace = Duration::from_secs(state.config.server.shutdown_grace_seconds);
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        AppError::with_source(ErrorKind::Internal, format!("Failed to bind {addr}"), e)
    })?;
    info!(addr = %addr, "TokenGate listening");

    let (signal_tx, mut signal_rx) = watch::channel(false);
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = signal_tx.send(true);
        })
        .into_future();
    let mut server = std::pin::pin!(server);

    tokio::select! {
        result = &mut server => return result.map_err(server_error),
        _ = signal_rx.changed() => {
            info!(grace_seconds = grace.as_secs(), "Shutdown signal received, draining");
        }
    }

    match tokio::time::timeout(grace, server).await {
        Ok(result) => result.map_err(server_error),
        Err(_) => {
            warn!("Shutdown grace period elapsed, dropping open connections");
            Ok(())
        }
    }
}

fn server_error(e: std::io::Error) -> AppError {
    AppError::with_source(ErrorKind::Internal, "Server error", e)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
