//! Health check handler.

use axum::extract::State;
use tracing::warn;

use tokengate_core::traits::cache::CacheProvider;

use crate::dto::response::{ApiResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> ApiResponse<HealthResponse> {
    let cache_up = match state.cache.health_check().await {
        Ok(up) => up,
        Err(e) => {
            warn!(error = %e, "Cache health check failed");
            false
        }
    };

    let database = match &state.db_pool {
        None => "memory",
        Some(pool) => match pool.health_check().await {
            Ok(true) => "connected",
            Ok(false) => "unavailable",
            Err(e) => {
                warn!(error = %e, "Database health check failed");
                "unavailable"
            }
        },
    };

    let healthy = cache_up && database != "unavailable";
    ApiResponse::ok(
        HealthResponse {
            status: if healthy { "ok" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: database.to_string(),
            cache: if cache_up { "connected" } else { "unavailable" }.to_string(),
        },
        "Service is running",
    )
}
