//! JobLens server - main entry point
//!
//! Multi-user job-listing aggregation service: runs update cycles against
//! the external search and detail feeds, accumulates deduplicated postings
//! per user, and serves keyword search plus live progress streaming.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use joblens_common::config::{ConfigOverrides, ServerConfig};
use joblens_server::auth::JwtService;
use joblens_server::pipeline::{HttpDetailFeed, HttpSearchFeed};
use joblens_server::store::SqliteStore;
use joblens_server::{build_router, db, AppState};

/// Command-line arguments for joblens-server
#[derive(Parser, Debug)]
#[command(name = "joblens-server")]
#[command(about = "Job-listing aggregation service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "JOBLENS_PORT")]
    port: Option<u16>,

    /// SQLite database path
    #[arg(short, long, env = "JOBLENS_DB")]
    database: Option<PathBuf>,

    /// Secret used to sign session tokens
    #[arg(long, env = "JOBLENS_JWT_SECRET")]
    jwt_secret: Option<String>,

    /// Base URL of the search-link feed
    #[arg(long, env = "JOBLENS_SEARCH_FEED_URL")]
    search_feed_url: Option<String>,

    /// Base URL of the posting-detail feed
    #[arg(long, env = "JOBLENS_DETAIL_FEED_URL")]
    detail_feed_url: Option<String>,

    /// Frontend origin allowed by CORS
    #[arg(long, env = "JOBLENS_ALLOWED_ORIGIN")]
    allowed_origin: Option<String>,

    /// Cap on concurrently running update cycles
    #[arg(long, env = "JOBLENS_MAX_CONCURRENT_UPDATES")]
    max_concurrent_updates: Option<usize>,

    /// Optional TOML config file
    #[arg(short, long, env = "JOBLENS_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "joblens_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let overrides = ConfigOverrides {
        port: args.port,
        database_path: args.database,
        jwt_secret: args.jwt_secret,
        search_feed_url: args.search_feed_url,
        detail_feed_url: args.detail_feed_url,
        allowed_origin: args.allowed_origin,
        max_concurrent_updates: args.max_concurrent_updates,
    };
    let config = ServerConfig::resolve(overrides, args.config.as_deref())
        .context("Failed to resolve configuration")?;

    info!("Starting JobLens server on port {}", config.port);
    info!("Database: {}", config.database_path.display());

    let pool = db::connect(&config.database_path)
        .await
        .context("Failed to open database")?;
    db::init_schema(&pool)
        .await
        .context("Failed to initialize database")?;

    let search_feed = HttpSearchFeed::new(config.search_feed_url.clone())
        .context("Failed to build search feed client")?;
    let detail_feed = HttpDetailFeed::new(config.detail_feed_url.clone())
        .context("Failed to build detail feed client")?;

    let state = AppState::new(
        pool.clone(),
        Arc::new(SqliteStore::new(pool)),
        Arc::new(search_feed),
        Arc::new(detail_feed),
        JwtService::new(&config.jwt_secret),
        config.max_concurrent_updates,
    );

    let app = build_router(state, &config.allowed_origin).context("Failed to build router")?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
