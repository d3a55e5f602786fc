//! Authenticated-identity extractor
//!
//! Pulls the Bearer token from the Authorization header, or from a `token`
//! query parameter for EventSource clients that cannot set headers, and
//! verifies it. Invalid or expired tokens are rejected with 401 before the
//! handler runs.

use crate::error::ApiError;
use crate::AppState;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

/// The verified identity (email) of the requesting user
pub struct AuthedUser(pub String);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .or_else(|| query_token(parts))
            .ok_or_else(|| ApiError::Unauthorized("Missing auth token".to_string()))?;

        let identity = state.jwt.verify_token(&token)?;
        Ok(AuthedUser(identity))
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

fn query_token(parts: &Parts) -> Option<String> {
    parts
        .uri
        .query()?
        .split('&')
        .find_map(|pair| pair.strip_prefix("token="))
        .map(str::to_string)
}
