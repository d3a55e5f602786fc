//! SQLite-backed Tabular Store

use super::{StoreDescriptor, TabularStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use joblens_common::{Error, Record, Result, SheetKind};
use sqlx::{Row, SqlitePool};
use tracing::{info, warn};

/// Tabular Store persisting workbooks in the service database
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create store tables if missing; idempotent, run at startup
    pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS store_descriptors (
                identity TEXT PRIMARY KEY,
                descriptor TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sheet_rows (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                identity TEXT NOT NULL,
                sheet TEXT NOT NULL,
                link TEXT NOT NULL,
                fields TEXT NOT NULL,
                added_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_sheet_rows_identity_sheet
             ON sheet_rows (identity, sheet)",
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn save_descriptor(&self, identity: &str, descriptor: &StoreDescriptor) -> Result<()> {
        let json = serde_json::to_string(descriptor)
            .map_err(|e| Error::Internal(format!("Cannot serialize descriptor: {}", e)))?;
        sqlx::query(
            r#"
            INSERT INTO store_descriptors (identity, descriptor, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(identity) DO UPDATE SET
                descriptor = excluded.descriptor,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(identity)
        .bind(json)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl TabularStore for SqliteStore {
    async fn attach(&self, identity: &str) -> Result<StoreDescriptor> {
        let stored: Option<String> =
            sqlx::query_scalar("SELECT descriptor FROM store_descriptors WHERE identity = ?")
                .bind(identity)
                .fetch_optional(&self.pool)
                .await?;

        if let Some(json) = stored {
            match serde_json::from_str::<StoreDescriptor>(&json) {
                Ok(descriptor) => return Ok(descriptor),
                Err(e) => {
                    // Malformed descriptor is handled locally: recreate.
                    warn!(identity, error = %e, "Malformed store descriptor, creating new workbook");
                }
            }
        } else {
            info!(identity, "No store descriptor found, creating new workbook");
        }

        let descriptor = StoreDescriptor::new_workbook();
        self.save_descriptor(identity, &descriptor).await?;
        Ok(descriptor)
    }

    async fn sheet_links(&self, identity: &str, sheet: SheetKind) -> Result<Vec<String>> {
        let links = sqlx::query_scalar(
            "SELECT link FROM sheet_rows WHERE identity = ? AND sheet = ? ORDER BY id",
        )
        .bind(identity)
        .bind(sheet.title())
        .fetch_all(&self.pool)
        .await?;
        Ok(links)
    }

    async fn sheet_records(&self, identity: &str, sheet: SheetKind) -> Result<Vec<Record>> {
        let rows = sqlx::query(
            "SELECT link, fields, added_at FROM sheet_rows
             WHERE identity = ? AND sheet = ? ORDER BY id",
        )
        .bind(identity)
        .bind(sheet.title())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let fields: String = row.get("fields");
                let fields = serde_json::from_str(&fields)
                    .map_err(|e| Error::Internal(format!("Corrupt sheet row fields: {}", e)))?;
                let added_at: String = row.get("added_at");
                let added_at = DateTime::parse_from_rfc3339(&added_at)
                    .map_err(|e| Error::Internal(format!("Corrupt sheet row timestamp: {}", e)))?
                    .with_timezone(&Utc);
                Ok(Record {
                    link: row.get("link"),
                    fields,
                    added_at,
                })
            })
            .collect()
    }

    async fn append_records(
        &self,
        identity: &str,
        sheet: SheetKind,
        rows: &[Record],
    ) -> Result<()> {
        for record in rows {
            let fields = serde_json::to_string(&record.fields)
                .map_err(|e| Error::Internal(format!("Cannot serialize record fields: {}", e)))?;
            sqlx::query(
                "INSERT INTO sheet_rows (identity, sheet, link, fields, added_at)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(identity)
            .bind(sheet.title())
            .bind(&record.link)
            .bind(fields)
            .bind(record.added_at.to_rfc3339())
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_store() -> SqliteStore {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();
        SqliteStore::init_schema(&pool).await.unwrap();
        SqliteStore::new(pool)
    }

    #[tokio::test]
    async fn attach_creates_then_reattaches() {
        let store = setup_store().await;
        let first = store.attach("user@example.com").await.unwrap();
        let second = store.attach("user@example.com").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.search_columns,
            vec!["link".to_string(), "added_at".to_string()]
        );
    }

    #[tokio::test]
    async fn malformed_descriptor_triggers_recreation() {
        let store = setup_store().await;
        sqlx::query(
            "INSERT INTO store_descriptors (identity, descriptor, updated_at)
             VALUES (?, ?, ?)",
        )
        .bind("user@example.com")
        .bind("{not json")
        .bind(Utc::now().to_rfc3339())
        .execute(&store.pool)
        .await
        .unwrap();

        let descriptor = store.attach("user@example.com").await.unwrap();
        // The replacement descriptor persists for the next attach.
        let again = store.attach("user@example.com").await.unwrap();
        assert_eq!(descriptor, again);
    }

    #[tokio::test]
    async fn appends_accumulate_in_order_per_sheet() {
        let store = setup_store().await;
        let stamp = Utc::now();

        store
            .append_records(
                "user@example.com",
                SheetKind::SearchResults,
                &[Record::from_link("https://a", stamp)],
            )
            .await
            .unwrap();
        store
            .append_records(
                "user@example.com",
                SheetKind::SearchResults,
                &[Record::from_link("https://b", stamp)],
            )
            .await
            .unwrap();

        let links = store
            .sheet_links("user@example.com", SheetKind::SearchResults)
            .await
            .unwrap();
        assert_eq!(links, vec!["https://a".to_string(), "https://b".to_string()]);

        // The other sheet and other users stay empty.
        assert!(store
            .sheet_links("user@example.com", SheetKind::Postings)
            .await
            .unwrap()
            .is_empty());
        assert!(store
            .sheet_links("other@example.com", SheetKind::SearchResults)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn records_round_trip_with_fields() {
        let store = setup_store().await;
        let mut record = Record::from_link("https://jobs.example/view/a-1234567890", Utc::now());
        record
            .fields
            .insert("title".to_string(), "Rust Developer".to_string());

        store
            .append_records("user@example.com", SheetKind::Postings, &[record.clone()])
            .await
            .unwrap();

        let records = store
            .sheet_records("user@example.com", SheetKind::Postings)
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].link, record.link);
        assert_eq!(records[0].field("title"), "Rust Developer");
    }
}
