//! API error types
//!
//! Internal pipeline and broadcast errors are caught at the request
//! boundary and translated here into a structured response; they never
//! crash a worker or the serving loop.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use joblens_common::Error;
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid credentials or invalid/expired token (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Conflict (409) - duplicate registration, update already running
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Upstream extraction feed failed (502)
    #[error("Upstream extraction failed: {0}")]
    Upstream(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Auth(msg) => ApiError::Unauthorized(msg),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::DataIntegrity(msg) => ApiError::Conflict(msg),
            Error::Extraction(msg) => ApiError::Upstream(msg),
            Error::Config(msg) => ApiError::Internal(format!("Configuration error: {}", msg)),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_errors_map_to_expected_status() {
        let cases = [
            (Error::Auth("bad token".into()), StatusCode::UNAUTHORIZED),
            (Error::DataIntegrity("dup".into()), StatusCode::CONFLICT),
            (Error::Extraction("feed died".into()), StatusCode::BAD_GATEWAY),
            (Error::InvalidInput("bad".into()), StatusCode::BAD_REQUEST),
            (Error::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (Error::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), status);
        }
    }
}
