//! Response DTOs.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tokengate_core::error::ErrorKind;
use tokengate_entity::user::User;

/// The envelope every endpoint answers with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Whether the request succeeded.
    pub ok: bool,
    /// `SUCCESS`, `CREATED`, or the error kind code.
    pub status: String,
    /// HTTP status code, repeated in the body.
    pub status_code: u16,
    /// Payload, absent on failure.
    pub data: Option<T>,
    /// Human-readable message.
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    /// A 200 response.
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            status: "SUCCESS".to_string(),
            status_code: StatusCode::OK.as_u16(),
            data: Some(data),
            message: message.into(),
        }
    }

    /// A 201 response.
    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            status: "CREATED".to_string(),
            status_code: StatusCode::CREATED.as_u16(),
            data: Some(data),
            message: message.into(),
        }
    }
}

impl ApiResponse<()> {
    /// A failure response without payload.
    pub fn failure(kind: ErrorKind, status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            status: kind.to_string(),
            status_code: status.as_u16(),
            data: None,
            message: message.into(),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Public view of an account. The password digest is never part of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    /// User ID.
    pub id: Uuid,
    /// Username.
    pub username: String,
    /// Email.
    pub email: String,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Phone number.
    pub phone_number: Option<String>,
    /// Date of birth.
    pub birth_date: Option<NaiveDate>,
    /// Whether the account can log in.
    pub is_active: bool,
    /// Whether the email address is confirmed.
    pub email_verified: bool,
    /// Registration time.
    pub created_at: DateTime<Utc>,
    /// Last update.
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            phone_number: user.phone_number,
            birth_date: user.birth_date,
            is_active: user.is_active,
            email_verified: user.email_verified,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// `connected`, `unavailable`, or `memory`.
    pub database: String,
    /// `connected` or `unavailable`.
    pub cache: String,
}
