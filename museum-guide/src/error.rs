//! Error types for museum-guide HTTP handlers

use crate::services::RecognitionError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Quota exhausted (429)
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Caller not on the allow-list (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// External capability failed (503)
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// museum-common error
    #[error("Common error: {0}")]
    Common(#[from] museum_common::Error),
}

impl From<RecognitionError> for ApiError {
    fn from(err: RecognitionError) -> Self {
        use crate::services::RejectReason;

        match err {
            RecognitionError::RateLimited(RejectReason::CallerNotAllowed) => {
                ApiError::Forbidden(RejectReason::CallerNotAllowed.to_string())
            }
            RecognitionError::RateLimited(reason) => ApiError::RateLimited(reason.to_string()),
            RecognitionError::InvalidInput(msg) => ApiError::BadRequest(msg),
            RecognitionError::UpstreamUnavailable(msg) => ApiError::UpstreamUnavailable(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::RateLimited(msg) => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::UpstreamUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "UPSTREAM_UNAVAILABLE",
                msg,
            ),
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
