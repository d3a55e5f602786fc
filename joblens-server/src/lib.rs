//! JobLens server library
//!
//! Exposes application state and router construction for the binary and
//! for integration tests.

pub mod api;
pub mod auth;
pub mod db;
pub mod error;
pub mod pipeline;
pub mod session;
pub mod store;

pub use crate::error::{ApiError, ApiResult};

use crate::auth::JwtService;
use crate::pipeline::{DetailFeed, SearchFeed};
use crate::session::SessionRegistry;
use crate::store::TabularStore;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use joblens_common::{Error, Result};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tower_http::cors::CorsLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// User account database
    pub db: SqlitePool,
    /// Durable accumulated datasets
    pub store: Arc<dyn TabularStore>,
    /// External search-link producer
    pub search_feed: Arc<dyn SearchFeed>,
    /// External posting-record producer
    pub detail_feed: Arc<dyn DetailFeed>,
    /// Identity-to-session mapping
    pub sessions: Arc<SessionRegistry>,
    /// Token issuance/verification
    pub jwt: JwtService,
    /// Admission gate bounding concurrently running update cycles
    pub update_gate: Arc<Semaphore>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        store: Arc<dyn TabularStore>,
        search_feed: Arc<dyn SearchFeed>,
        detail_feed: Arc<dyn DetailFeed>,
        jwt: JwtService,
        max_concurrent_updates: usize,
    ) -> Self {
        Self {
            db,
            store,
            search_feed,
            detail_feed,
            sessions: Arc::new(SessionRegistry::new()),
            jwt,
            update_gate: Arc::new(Semaphore::new(max_concurrent_updates.max(1))),
        }
    }
}

/// Build the application router
pub fn build_router(state: AppState, allowed_origin: &str) -> Result<Router> {
    let origin = allowed_origin
        .parse::<HeaderValue>()
        .map_err(|_| Error::Config(format!("Invalid allowed origin: {}", allowed_origin)))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    Ok(Router::new()
        .route("/health", get(api::health))
        .route("/auth/register", post(api::auth::register))
        .route("/auth/login", post(api::auth::login))
        .route("/auth/logout", post(api::auth::logout))
        .route("/update-database", post(api::update::update_database))
        .route("/job-postings", post(api::jobs::find_jobs))
        .route("/events", get(api::sse::stream_logs))
        .with_state(state)
        .layer(cors))
}
