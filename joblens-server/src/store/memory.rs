//! In-memory Tabular Store
//!
//! Backend for tests and ephemeral deployments; same contract as the
//! SQLite store, nothing survives a restart.

use super::{StoreDescriptor, TabularStore};
use async_trait::async_trait;
use joblens_common::{Record, Result, SheetKind};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct UserWorkbook {
    descriptor: Option<StoreDescriptor>,
    sheets: HashMap<SheetKind, Vec<Record>>,
}

/// Tabular Store held entirely in process memory
#[derive(Default)]
pub struct MemoryStore {
    workbooks: Mutex<HashMap<String, UserWorkbook>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TabularStore for MemoryStore {
    async fn attach(&self, identity: &str) -> Result<StoreDescriptor> {
        let mut workbooks = self.workbooks.lock().expect("memory store lock poisoned");
        let workbook = workbooks.entry(identity.to_string()).or_default();
        Ok(workbook
            .descriptor
            .get_or_insert_with(StoreDescriptor::new_workbook)
            .clone())
    }

    async fn sheet_links(&self, identity: &str, sheet: SheetKind) -> Result<Vec<String>> {
        let workbooks = self.workbooks.lock().expect("memory store lock poisoned");
        Ok(workbooks
            .get(identity)
            .and_then(|workbook| workbook.sheets.get(&sheet))
            .map(|rows| rows.iter().map(|record| record.link.clone()).collect())
            .unwrap_or_default())
    }

    async fn sheet_records(&self, identity: &str, sheet: SheetKind) -> Result<Vec<Record>> {
        let workbooks = self.workbooks.lock().expect("memory store lock poisoned");
        Ok(workbooks
            .get(identity)
            .and_then(|workbook| workbook.sheets.get(&sheet))
            .cloned()
            .unwrap_or_default())
    }

    async fn append_records(
        &self,
        identity: &str,
        sheet: SheetKind,
        rows: &[Record],
    ) -> Result<()> {
        let mut workbooks = self.workbooks.lock().expect("memory store lock poisoned");
        workbooks
            .entry(identity.to_string())
            .or_default()
            .sheets
            .entry(sheet)
            .or_default()
            .extend_from_slice(rows);
        Ok(())
    }
}
