//! User account storage
//!
//! Duplicate registration and failed authentication are reported as
//! negative results rather than errors; the caller decides what happens
//! next.

use crate::auth::{hash_password, verify_password};
use chrono::Utc;
use joblens_common::Result;
use sqlx::SqlitePool;
use tracing::info;

/// Create the users table if missing
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            email TEXT PRIMARY KEY,
            password_hash TEXT NOT NULL,
            credentials TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Register a new user; returns false when the email is already taken
pub async fn register_user(
    pool: &SqlitePool,
    email: &str,
    password: &str,
    credentials: Option<&serde_json::Value>,
) -> Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)")
        .bind(email)
        .fetch_one(pool)
        .await?;
    if exists {
        return Ok(false);
    }

    let now = Utc::now().to_rfc3339();
    sqlx::query(
        "INSERT INTO users (email, password_hash, credentials, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(email)
    .bind(hash_password(password))
    .bind(credentials.map(|value| value.to_string()))
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    info!(email, "Registered new user");
    Ok(true)
}

/// Verify a user's password; unknown emails authenticate as false
pub async fn authenticate_user(pool: &SqlitePool, email: &str, password: &str) -> Result<bool> {
    let stored: Option<String> =
        sqlx::query_scalar("SELECT password_hash FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await?;

    Ok(match stored {
        Some(hash) => verify_password(password, &hash),
        None => false,
    })
}
