//! Account handlers: recovery, verification, profile, deactivation.

use axum::extract::State;

use tokengate_entity::user::UpdateProfile;
use tokengate_service::VerificationStatus;

use crate::dto::request::{
    ConfirmAccountRequest, ForgotPasswordRequest, ResetPasswordRequest, UpdateProfileRequest,
};
use crate::dto::response::{ApiResponse, UserResponse};
use crate::error::ApiResult;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::state::AppState;

/// POST /api/auth/forgot-password
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ForgotPasswordRequest>,
) -> ApiResult<ApiResponse<()>> {
    state.recovery_service.forgot_password(&req.email).await?;
    Ok(ApiResponse::ok(
        (),
        "If the address is registered, a reset link has been sent",
    ))
}

/// PATCH /api/auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ResetPasswordRequest>,
) -> ApiResult<ApiResponse<()>> {
    state
        .recovery_service
        .reset_password(&req.token, &req.new_password)
        .await?;
    Ok(ApiResponse::ok((), "Password has been reset"))
}

/// POST /api/auth/account-verification
pub async fn request_verification(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<ApiResponse<()>> {
    let message = match state.recovery_service.request_verification(&auth.user).await? {
        VerificationStatus::AlreadyVerified => "Email is already verified",
        VerificationStatus::Sent => "Verification link has been sent",
    };
    Ok(ApiResponse::ok((), message))
}

/// PATCH /api/auth/account-confirmation
pub async fn confirm_account(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ConfirmAccountRequest>,
) -> ApiResult<ApiResponse<()>> {
    let message = if state.recovery_service.confirm_email(&req.token).await? {
        "Email verified"
    } else {
        "Email is already verified"
    };
    Ok(ApiResponse::ok((), message))
}

/// PATCH /api/auth/update-profile
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> ApiResult<ApiResponse<UserResponse>> {
    let changes = UpdateProfile {
        id: auth.user.id,
        first_name: req.first_name,
        last_name: req.last_name,
        phone_number: req.phone_number,
        birth_date: req.birth_date,
    };
    let user = state.user_service.update_profile(&auth.user, changes).await?;
    Ok(ApiResponse::ok(UserResponse::from(user), "Profile updated"))
}

/// PATCH /api/auth/deactivate-account
pub async fn deactivate_account(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<ApiResponse<()>> {
    let message = if state.user_service.deactivate_account(&auth.user).await? {
        "Account deactivated"
    } else {
        "Account is already deactivated"
    };
    Ok(ApiResponse::ok((), message))
}
