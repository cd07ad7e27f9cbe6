//! Request DTOs with validation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use tokengate_service::Registration;

/// Registration request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Desired username.
    #[validate(length(min = 3, max = 50, message = "Username must be 3 to 50 characters"))]
    pub username: String,
    /// Email address.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Plaintext password; strength is checked by the password policy.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    /// Given name.
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    /// Family name.
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    /// Contact phone number.
    #[validate(length(max = 32))]
    pub phone_number: Option<String>,
    /// Date of birth.
    pub birth_date: Option<NaiveDate>,
}

impl From<RegisterRequest> for Registration {
    fn from(req: RegisterRequest) -> Self {
        Self {
            username: req.username,
            email: req.email,
            password: req.password,
            first_name: req.first_name,
            last_name: req.last_name,
            phone_number: req.phone_number,
            birth_date: req.birth_date,
        }
    }
}

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username.
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Token refresh request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RefreshRequest {
    /// Refresh token.
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Password change request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    /// Current password.
    #[validate(length(min = 1, message = "Current password is required"))]
    pub old_password: String,
    /// New password.
    #[validate(length(min = 1, message = "New password is required"))]
    pub new_password: String,
}

/// Forgot-password request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    /// Address the reset link goes to.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

/// Password reset from an emailed link.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    /// Token from the reset link.
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
    /// New password.
    #[validate(length(min = 1, message = "New password is required"))]
    pub new_password: String,
}

/// Email confirmation from an emailed link.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConfirmAccountRequest {
    /// Token from the verification link.
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
}

/// Update profile request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    /// Given name.
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    /// Family name.
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    /// Phone number.
    #[validate(length(max = 32))]
    pub phone_number: Option<String>,
    /// Date of birth.
    pub birth_date: Option<NaiveDate>,
}
