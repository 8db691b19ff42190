use axum::{http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::AuthError;
use crate::config::ConfigError;

/// Standard error response
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
    /// Machine-readable error type code
    pub error_type: String,
    /// Underlying cause, only populated in development mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, error_type: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            error_type: error_type.into(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Debug, Serialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

impl SuccessResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

pub fn bad_request(error: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(error, "BAD_REQUEST")),
    )
}

pub fn unauthorized(error: impl Into<String>) -> ApiError {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new(error, "UNAUTHORIZED")),
    )
}

pub fn not_found(error: impl Into<String>) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(error, "NOT_FOUND")),
    )
}

/// Log `err` and answer 500. The cause is only echoed back in development.
pub fn internal_error(
    error: impl Into<String>,
    err: impl std::fmt::Display,
    development: bool,
) -> ApiError {
    let error = error.into();
    tracing::error!("{}: {}", error, err);

    let mut body = ErrorResponse::new(error, "INTERNAL_ERROR");
    if development {
        body = body.with_message(err.to_string());
    }
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body))
}

pub fn auth_error(err: AuthError, development: bool) -> ApiError {
    match err {
        AuthError::MissingCredentials => bad_request(err.to_string()),
        AuthError::InvalidCredentials => unauthorized(err.to_string()),
        AuthError::SessionExpired => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new(err.to_string(), "SESSION_EXPIRED")),
        ),
        AuthError::Unauthenticated => unauthorized(err.to_string()),
        AuthError::Internal(e) => internal_error("Authentication failed", e, development),
    }
}

pub fn config_error(err: ConfigError, development: bool) -> ApiError {
    match err {
        ConfigError::AlreadyComplete => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(err.to_string(), "SETUP_COMPLETE")),
        ),
        other => internal_error("Failed to update configuration", other, development),
    }
}
