//! Auth handlers: register, login, me, logout, refresh, password change.

use axum::extract::State;
use tracing::info;

use tokengate_auth::TokenPair;
use tokengate_auth::revocation::RevocationReport;

use crate::dto::request::{ChangePasswordRequest, LoginRequest, RefreshRequest, RegisterRequest};
use crate::dto::response::{ApiResponse, UserResponse};
use crate::error::ApiResult;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::state::AppState;

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<ApiResponse<UserResponse>> {
    let user = state.user_service.register(req.into()).await?;
    Ok(ApiResponse::created(
        UserResponse::from(user),
        "Account created",
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<ApiResponse<TokenPair>> {
    let pair = state
        .session_manager
        .login(&req.username, &req.password)
        .await?;
    Ok(ApiResponse::ok(pair, "Logged in"))
}

/// GET /api/auth/me
pub async fn me(auth: AuthUser) -> ApiResult<ApiResponse<UserResponse>> {
    let AuthUser(principal) = auth;
    Ok(ApiResponse::ok(
        UserResponse::from(principal.user),
        "Authenticated",
    ))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<ApiResponse<()>> {
    state.session_manager.logout(&auth.token).await?;
    Ok(ApiResponse::ok((), "Logged out successfully"))
}

/// POST /api/auth/logout-all
pub async fn logout_all(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<ApiResponse<RevocationReport>> {
    let report = state.session_manager.logout_all(&auth.user).await?;
    info!(user_id = %auth.user.id, revoked = report.revoked, "Logged out everywhere");
    Ok(ApiResponse::ok(report, "Logged out of all sessions"))
}

/// POST /api/auth/refresh-token
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> ApiResult<ApiResponse<TokenPair>> {
    let pair = state.session_manager.refresh(&req.refresh_token).await?;
    Ok(ApiResponse::ok(pair, "Token refreshed"))
}

/// PUT /api/auth/change-password
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> ApiResult<ApiResponse<RevocationReport>> {
    let report = state
        .session_manager
        .change_password(&auth, &req.old_password, &req.new_password)
        .await?;
    Ok(ApiResponse::ok(
        report,
        "Password changed, please log in again",
    ))
}
