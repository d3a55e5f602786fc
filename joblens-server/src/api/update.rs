//! Update-cycle trigger

use crate::api::AuthedUser;
use crate::error::{ApiError, ApiResult};
use crate::pipeline::Aggregator;
use crate::AppState;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

/// POST /update-database request
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub locations: Vec<String>,
    pub queries: Vec<String>,
}

/// POST /update-database response
#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub message: &'static str,
}

/// POST /update-database
///
/// Runs one full update cycle for the caller. The cycle holds the session's
/// run lock for its duration; a second request for the same identity while
/// one is running is rejected with 409 rather than queued. Distinct
/// identities run independently, bounded by the admission gate.
pub async fn update_database(
    State(state): State<AppState>,
    AuthedUser(identity): AuthedUser,
    Json(request): Json<UpdateRequest>,
) -> ApiResult<Json<UpdateResponse>> {
    if request.queries.is_empty() {
        return Err(ApiError::BadRequest(
            "At least one search query is required".to_string(),
        ));
    }

    let session = state.sessions.get_or_create(&identity);
    let _run_guard = session.run_lock.try_lock().map_err(|_| {
        ApiError::Conflict("An update is already running for this user".to_string())
    })?;

    let _permit = state
        .update_gate
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| ApiError::Internal("Update gate closed".to_string()))?;

    info!(identity, "Starting update cycle");
    let aggregator = Aggregator::new(
        identity.clone(),
        state.store.clone(),
        state.search_feed.clone(),
        state.detail_feed.clone(),
        session.clone(),
    );
    aggregator.run(request.locations, request.queries).await?;

    Ok(Json(UpdateResponse {
        message: "Database updated",
    }))
}
