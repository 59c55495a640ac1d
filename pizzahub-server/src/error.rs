//! Service error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Email already in use")]
    EmailInUse,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("No verification code found")]
    NoVerificationCode,

    #[error("Verification code expired")]
    VerificationExpired,

    #[error("Invalid verification code")]
    InvalidVerificationCode,

    #[error("No account for this email")]
    UnknownEmail,

    #[error("No auth token")]
    Unauthenticated,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token user not found")]
    UserNotFound,

    #[error("Forbidden")]
    Forbidden,

    #[error("User blocked")]
    UserBlocked,

    #[error("Email not verified")]
    EmailNotVerified,

    #[error("Not an admin")]
    NotAnAdmin,

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<pizzahub_core::Error> for ApiError {
    fn from(err: pizzahub_core::Error) -> Self {
        use pizzahub_core::Error;

        match err {
            Error::InvalidToken(_) | Error::TokenExpired => ApiError::InvalidToken,
            Error::InvalidStatus(_) => ApiError::Validation("Invalid status".to_string()),
            Error::Signing(msg) => ApiError::Storage(msg),
            other => ApiError::Validation(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors.field_errors().keys().map(|k| k.to_string()).collect();
        fields.sort();
        ApiError::Validation(format!("Invalid fields: {}", fields.join(", ")))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message): (StatusCode, &str) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            ApiError::EmailInUse => (StatusCode::BAD_REQUEST, "Email already in use"),
            ApiError::InvalidCredentials => (StatusCode::BAD_REQUEST, "Invalid credentials"),
            ApiError::NoVerificationCode => (
                StatusCode::BAD_REQUEST,
                "No verification code found. Please request a new code.",
            ),
            ApiError::VerificationExpired => (
                StatusCode::BAD_REQUEST,
                "Code expired. Please request a new code.",
            ),
            ApiError::InvalidVerificationCode => (StatusCode::BAD_REQUEST, "Invalid code"),
            ApiError::UnknownEmail => (StatusCode::BAD_REQUEST, "User not found"),
            ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, "No auth token"),
            ApiError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token"),
            ApiError::UserNotFound => {
                (StatusCode::UNAUTHORIZED, "Invalid token - user not found")
            }
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden"),
            ApiError::UserBlocked => (StatusCode::FORBIDDEN, "User blocked"),
            ApiError::EmailNotVerified => (StatusCode::FORBIDDEN, "Email not verified"),
            ApiError::NotAnAdmin => (StatusCode::FORBIDDEN, "Not an admin"),
            ApiError::NotFound(what) => (StatusCode::NOT_FOUND, *what),
            ApiError::Storage(msg) => {
                tracing::error!("Storage error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error")
            }
        };

        let body = json!({ "message": message });
        (status, axum::Json(body)).into_response()
    }
}
