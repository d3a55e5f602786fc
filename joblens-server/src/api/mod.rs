//! HTTP API handlers

pub mod auth;
pub mod extract;
pub mod jobs;
pub mod sse;
pub mod update;

pub use extract::AuthedUser;

use axum::http::StatusCode;

/// Health check endpoint
pub async fn health() -> StatusCode {
    StatusCode::OK
}
