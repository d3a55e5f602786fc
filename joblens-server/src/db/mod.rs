//! Database connection and schema initialization

pub mod users;

use crate::store::SqliteStore;
use joblens_common::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;

/// Open (creating if missing) the service database
pub async fn connect(path: &Path) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    Ok(pool)
}

/// Initialize all required database structures; idempotent
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    info!("Initializing database structures");
    users::init_schema(pool).await?;
    SqliteStore::init_schema(pool).await?;
    info!("Database initialization complete");
    Ok(())
}
