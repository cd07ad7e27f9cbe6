//! Route definitions for the TokenGate HTTP API.
//!
//! All routes are mounted under `/api`. The router receives `AppState` and
//! passes it to all handlers via Axum's `State` extractor.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, patch, post, put},
};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the API router with all routes and per-route middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(auth_routes(state.clone()))
        .merge(account_routes())
        .merge(health_routes());

    Router::new()
        .nest("/api", api_routes)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Credential-bearing endpoints, throttled per client.
fn auth_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh-token", post(handlers::auth::refresh_token))
        .route("/auth/forgot-password", post(handlers::account::forgot_password))
        .route("/auth/reset-password", patch(handlers::account::reset_password))
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::rate_limit::rate_limit,
        ))
}

/// Endpoints acting on the authenticated caller.
fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(handlers::auth::me))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/logout-all", post(handlers::auth::logout_all))
        .route("/auth/change-password", put(handlers::auth::change_password))
        .route(
            "/auth/account-verification",
            post(handlers::account::request_verification),
        )
        .route(
            "/auth/account-confirmation",
            patch(handlers::account::confirm_account),
        )
        .route("/auth/update-profile", patch(handlers::account::update_profile))
        .route(
            "/auth/deactivate-account",
            patch(handlers::account::deactivate_account),
        )
}

/// Liveness and dependency checks.
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
