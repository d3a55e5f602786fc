//! Keyword search over persisted postings

use crate::api::AuthedUser;
use crate::error::{ApiError, ApiResult};
use crate::pipeline::scoring::{find_by_keywords, ScoredPosting};
use crate::AppState;
use axum::extract::State;
use axum::Json;
use joblens_common::SheetKind;
use serde::{Deserialize, Serialize};
use tracing::info;

/// POST /job-postings request
#[derive(Debug, Deserialize)]
pub struct FindJobsRequest {
    pub keywords: Vec<String>,
    /// Exact-match location filter applied before scoring
    #[serde(default)]
    pub location: Option<String>,
}

/// POST /job-postings response
#[derive(Debug, Serialize)]
pub struct FindJobsResponse {
    pub job_postings: Vec<ScoredPosting>,
}

/// POST /job-postings
///
/// Scores the caller's accumulated postings against the supplied keywords
/// and returns matches sorted by descending score. The dataset is read as
/// it stands; no update cycle is triggered.
pub async fn find_jobs(
    State(state): State<AppState>,
    AuthedUser(identity): AuthedUser,
    Json(request): Json<FindJobsRequest>,
) -> ApiResult<Json<FindJobsResponse>> {
    if request.keywords.is_empty() {
        return Err(ApiError::BadRequest(
            "At least one keyword is required".to_string(),
        ));
    }

    let records = state
        .store
        .sheet_records(&identity, SheetKind::Postings)
        .await?;
    let job_postings = find_by_keywords(&records, &request.keywords, request.location.as_deref());

    info!(
        identity,
        searched = records.len(),
        matched = job_postings.len(),
        "Keyword search"
    );
    Ok(Json(FindJobsResponse { job_postings }))
}
