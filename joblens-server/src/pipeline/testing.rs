//! Scripted feed doubles for tests
//!
//! Deterministic in-process stand-ins for the external scraping engine,
//! used by unit and integration tests to drive the pipeline without any
//! network access.

use crate::pipeline::feeds::{DetailFeed, SearchFeed};
use chrono::Utc;
use joblens_common::types::{FIELD_COMPANY, FIELD_DESCRIPTION, FIELD_LOCATION, FIELD_TITLE};
use joblens_common::{Error, Record, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Search feed that replays a fixed script of link batches
#[derive(Default)]
pub struct ScriptedSearchFeed {
    batches: Vec<Vec<String>>,
    /// Fail after delivering this many batches
    fail_after: Option<usize>,
    pub fetch_calls: AtomicUsize,
    pub shutdown_calls: AtomicUsize,
}

impl ScriptedSearchFeed {
    pub fn new(batches: Vec<Vec<String>>) -> Self {
        Self {
            batches,
            ..Default::default()
        }
    }

    /// Deliver `deliver` batches, then fail the run
    pub fn failing_after(batches: Vec<Vec<String>>, deliver: usize) -> Self {
        Self {
            batches,
            fail_after: Some(deliver),
            ..Default::default()
        }
    }
}

impl SearchFeed for ScriptedSearchFeed {
    fn fetch_links(
        &self,
        _queries: &[String],
        _locations: &[String],
        on_batch: &mut dyn FnMut(Vec<String>) -> Result<()>,
    ) -> Result<()> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        for (index, batch) in self.batches.iter().enumerate() {
            if self.fail_after == Some(index) {
                return Err(Error::Extraction("scripted search failure".to_string()));
            }
            on_batch(batch.clone())?;
        }
        if self.fail_after == Some(self.batches.len()) {
            return Err(Error::Extraction("scripted search failure".to_string()));
        }
        Ok(())
    }

    fn shutdown(&self) -> Result<()> {
        self.shutdown_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Detail feed that fabricates one posting record per requested link
#[derive(Default)]
pub struct ScriptedDetailFeed {
    batch_size: usize,
    description: String,
    fail: bool,
    pub fetch_calls: AtomicUsize,
    pub shutdown_calls: AtomicUsize,
    pub requested_links: Mutex<Vec<String>>,
}

impl ScriptedDetailFeed {
    pub fn new(batch_size: usize, description: impl Into<String>) -> Self {
        Self {
            batch_size: batch_size.max(1),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn failing(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            fail: true,
            ..Default::default()
        }
    }

    fn posting_for(&self, link: &str) -> Record {
        let mut record = Record::from_link(link, Utc::now());
        record
            .fields
            .insert(FIELD_TITLE.to_string(), "Scripted Posting".to_string());
        record
            .fields
            .insert(FIELD_COMPANY.to_string(), "Scripted Co".to_string());
        record
            .fields
            .insert(FIELD_LOCATION.to_string(), "Testville".to_string());
        record
            .fields
            .insert(FIELD_DESCRIPTION.to_string(), self.description.clone());
        record
    }
}

impl DetailFeed for ScriptedDetailFeed {
    fn fetch_records(
        &self,
        links: &[String],
        on_batch: &mut dyn FnMut(Vec<Record>) -> Result<()>,
    ) -> Result<()> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.requested_links
            .lock()
            .expect("scripted feed lock poisoned")
            .extend(links.iter().cloned());
        if self.fail {
            return Err(Error::Extraction("scripted detail failure".to_string()));
        }
        for chunk in links.chunks(self.batch_size) {
            let batch = chunk.iter().map(|link| self.posting_for(link)).collect();
            on_batch(batch)?;
        }
        Ok(())
    }

    fn shutdown(&self) -> Result<()> {
        self.shutdown_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
