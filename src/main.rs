//! TokenGate Server: token-based authentication service.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{EnvFilter, fmt};

use tokengate_api::{Backends, build_state, serve};
use tokengate_cache::CacheManager;
use tokengate_core::config::AppConfig;
use tokengate_database::memory::{MemoryRefreshTokenRepository, MemoryUserRepository};
use tokengate_database::repositories::{PgRefreshTokenRepository, PgUserRepository};
use tokengate_database::{DatabasePool, RefreshTokenRepository, UserRepository};
use tokengate_core::traits::Mailer;
use tokengate_service::{LogMailer, SmtpMailer};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = format!("{e:#}"), "Server error");
        std::process::exit(1);
    }
}

/// Load configuration from `config/` and `TOKENGATE__*` variables.
fn load_configuration() -> anyhow::Result<AppConfig> {
    let env = std::env::var("TOKENGATE_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env).with_context(|| format!("loading configuration for '{env}'"))
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting TokenGate v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    let (user_repo, refresh_repo, db_pool): (
        Arc<dyn UserRepository>,
        Arc<dyn RefreshTokenRepository>,
        Option<DatabasePool>,
    ) = if config.database.is_memory() {
        tracing::warn!("Using the in-memory store; data is lost on restart");
        (
            Arc::new(MemoryUserRepository::new()),
            Arc::new(MemoryRefreshTokenRepository::new()),
            None,
        )
    } else {
        let db_pool = DatabasePool::connect(&config.database)
            .await
            .context("database connection failed")?;

        if config.database.run_migrations {
            tokengate_database::migration::run_migrations(db_pool.pool())
                .await
                .context("migration failed")?;
        }

        let statement_timeout = db_pool.statement_timeout();
        (
            Arc::new(PgUserRepository::new(
                db_pool.pool().clone(),
                statement_timeout,
            )),
            Arc::new(PgRefreshTokenRepository::new(
                db_pool.pool().clone(),
                statement_timeout,
            )),
            Some(db_pool),
        )
    };

    // ── Step 2: Initialize cache ─────────────────────────────────
    tracing::info!(provider = %config.cache.provider, "Initializing cache");
    let cache = Arc::new(
        CacheManager::new(&config.cache)
            .await
            .context("cache init failed")?,
    );

    // ── Step 3: Mail transport ───────────────────────────────────
    let mailer: Arc<dyn Mailer> = if config.mail.uses_smtp() {
        tracing::info!(server = %config.mail.server, "Using SMTP mail transport");
        Arc::new(SmtpMailer::new(&config.mail).context("mail transport init failed")?)
    } else {
        tracing::warn!("No SMTP server configured; mail is only logged");
        Arc::new(LogMailer::new(&config.mail))
    };

    // ── Step 4: Wire components and serve ────────────────────────
    let state = build_state(
        config,
        Backends {
            user_repo,
            refresh_repo,
            cache,
            mailer,
            db_pool: db_pool.clone(),
        },
    )
    .context("building application state")?;

    serve(state).await.context("HTTP server failed")?;

    if let Some(pool) = db_pool {
        pool.close().await;
    }
    tracing::info!("TokenGate stopped");
    Ok(())
}
