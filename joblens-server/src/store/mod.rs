//! Tabular Store boundary
//!
//! The durable dataset backing is a spreadsheet-like external collaborator:
//! one workbook per user holding two named sheets with a fixed column order.
//! The pipeline only queries snapshots and appends batches; it never
//! rewrites a sheet wholesale.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use joblens_common::{Record, Result, SheetKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Reattachment descriptor for one user's workbook.
///
/// Persisted across process restarts; its absence triggers first-run
/// workbook creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreDescriptor {
    pub workbook_id: Uuid,
    pub search_sheet_id: Uuid,
    pub postings_sheet_id: Uuid,
    pub search_columns: Vec<String>,
    pub posting_columns: Vec<String>,
}

impl StoreDescriptor {
    /// Descriptor for a freshly created workbook
    pub fn new_workbook() -> Self {
        Self {
            workbook_id: Uuid::new_v4(),
            search_sheet_id: Uuid::new_v4(),
            postings_sheet_id: Uuid::new_v4(),
            search_columns: SheetKind::SearchResults
                .columns()
                .iter()
                .map(|c| c.to_string())
                .collect(),
            posting_columns: SheetKind::Postings
                .columns()
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

/// Durable accumulated datasets, one workbook per user
#[async_trait]
pub trait TabularStore: Send + Sync {
    /// Reattach to the user's workbook, creating it on first run.
    ///
    /// A malformed persisted descriptor is handled locally: it is logged and
    /// replaced by a fresh workbook rather than propagated as an error.
    async fn attach(&self, identity: &str) -> Result<StoreDescriptor>;

    /// Snapshot of every link currently in the sheet, in append order
    async fn sheet_links(&self, identity: &str, sheet: SheetKind) -> Result<Vec<String>>;

    /// Snapshot of every record currently in the sheet, in append order
    async fn sheet_records(&self, identity: &str, sheet: SheetKind) -> Result<Vec<Record>>;

    /// Append one batch of records; each call is an independent unit with
    /// no cross-batch transaction.
    async fn append_records(
        &self,
        identity: &str,
        sheet: SheetKind,
        rows: &[Record],
    ) -> Result<()>;
}
