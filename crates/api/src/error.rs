//! API error types and handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use keystone_shared::AuthError;
use serde_json::json;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // Authentication errors
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token has expired")]
    ExpiredToken,
    #[error("Authentication required")]
    Unauthorized,
    #[error("Insufficient permissions")]
    Forbidden,

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("User under age")]
    UserUnderAge,

    // Resource errors
    #[error("Resource not found")]
    NotFound,
    #[error("User already exists")]
    UserExists,

    // Internal errors
    #[error("Database error: {0}")]
    Database(String),
    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // Authentication
            ApiError::InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN", self.to_string()),
            ApiError::ExpiredToken => (StatusCode::UNAUTHORIZED, "EXPIRED_TOKEN", self.to_string()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", self.to_string()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN", self.to_string()),

            // Validation
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            ApiError::UserUnderAge => (StatusCode::BAD_REQUEST, "USER_UNDER_AGE", self.to_string()),

            // Resources
            ApiError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string()),
            ApiError::UserExists => (StatusCode::CONFLICT, "USER_EXISTS", self.to_string()),

            // Internal
            ApiError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "Database error".to_string(),
            ),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                self.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken => ApiError::InvalidToken,
            AuthError::ExpiredToken => ApiError::ExpiredToken,
            AuthError::Unauthorized => ApiError::Unauthorized,
            AuthError::Forbidden => ApiError::Forbidden,
            AuthError::Validation(msg) => ApiError::Validation(msg),
            AuthError::UserUnderAge => ApiError::UserUnderAge,
            AuthError::UserExists => ApiError::UserExists,
            AuthError::NotFound => ApiError::NotFound,
            AuthError::Database(msg) => {
                tracing::error!(error = %msg, "Store failure surfaced to handler");
                ApiError::Database(msg)
            }
            AuthError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal failure surfaced to handler");
                ApiError::Internal
            }
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::from(AuthError::from(err))
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
