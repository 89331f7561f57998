//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Error taxonomy for the Qawafi API
///
/// Conflicts (duplicate username, like, or follow) map to 400 with a
/// generic message rather than 409, matching the client's contract.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing, malformed, or unverifiable bearer token
    #[error("Unauthorized")]
    Unauthorized,

    /// Malformed input with field-level detail
    #[error("Validation error: {0}")]
    Validation(String),

    /// Duplicate unique key (username/email, like, follow)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Referenced entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error; details are logged, never surfaced
    #[error("Internal server error")]
    InternalServerError,

    /// Database infrastructure error
    #[error("Database error: {0}")]
    Database(#[from] common::error::DatabaseError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::InternalServerError | ApiError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
