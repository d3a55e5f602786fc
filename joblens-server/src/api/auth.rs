//! Registration, login, and logout handlers

use crate::api::AuthedUser;
use crate::db::users;
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

/// POST /auth/register request
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    /// Opaque external-store credentials kept for the user
    #[serde(default)]
    pub credentials: Option<serde_json::Value>,
}

/// POST /auth/login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token response for register and login
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// POST /auth/logout response
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: &'static str,
}

/// POST /auth/register
///
/// Fails with 409 when the email is already registered.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<Json<TokenResponse>> {
    if request.email.trim().is_empty() || !request.email.contains('@') {
        return Err(ApiError::BadRequest("A valid email is required".to_string()));
    }
    if request.password.is_empty() {
        return Err(ApiError::BadRequest("A password is required".to_string()));
    }

    let created = users::register_user(
        &state.db,
        &request.email,
        &request.password,
        request.credentials.as_ref(),
    )
    .await?;
    if !created {
        return Err(ApiError::Conflict("Email is already registered".to_string()));
    }

    let token = state.jwt.create_token(&request.email)?;
    Ok(Json(TokenResponse { token }))
}

/// POST /auth/login
///
/// Fails with 401 on credential mismatch; never retried internally.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let authenticated =
        users::authenticate_user(&state.db, &request.email, &request.password).await?;
    if !authenticated {
        return Err(ApiError::Unauthorized("Invalid email or password".to_string()));
    }

    let token = state.jwt.create_token(&request.email)?;
    Ok(Json(TokenResponse { token }))
}

/// POST /auth/logout
///
/// Discards the caller's session; any live log subscribers are discarded
/// with it and their streams end.
pub async fn logout(
    State(state): State<AppState>,
    AuthedUser(identity): AuthedUser,
) -> ApiResult<Json<LogoutResponse>> {
    let removed = state.sessions.remove(&identity);
    info!(identity, removed, "Logout");
    Ok(Json(LogoutResponse {
        message: "Logged out",
    }))
}
