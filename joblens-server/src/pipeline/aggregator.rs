//! Aggregation pipeline
//!
//! Drives one full update cycle for one user: search feed batches are
//! deduplicated into the search sheet, then every search link without a
//! posting record is handed to the detail feed and the resulting postings
//! are deduplicated into the postings sheet. Progress is published to the
//! session log bus after every batch.
//!
//! The feeds are blocking producers; each stage runs its feed on a worker
//! thread (`spawn_blocking`) and bridges batches to the async side through
//! an mpsc channel, which preserves strict arrival order per feed. All
//! search batches complete before any detail work begins.
//!
//! Persistence is append-only with no cross-batch transaction: batches
//! appended before a mid-run failure stay persisted.

use crate::pipeline::dedup::{dedup_batch, link_not_in};
use crate::pipeline::feeds::{DetailFeed, SearchFeed};
use crate::session::Session;
use crate::store::TabularStore;
use chrono::Utc;
use joblens_common::events::UpdateEvent;
use joblens_common::{BatchItem, Error, Record, Result, SheetKind};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task;
use tracing::{info, warn};

/// Batches buffered between a blocking feed and the async ingest side
const FEED_CHANNEL_DEPTH: usize = 8;

/// One-run pipeline orchestrator for a single identity
pub struct Aggregator {
    identity: String,
    store: Arc<dyn TabularStore>,
    search_feed: Arc<dyn SearchFeed>,
    detail_feed: Arc<dyn DetailFeed>,
    session: Arc<Session>,
}

impl Aggregator {
    pub fn new(
        identity: impl Into<String>,
        store: Arc<dyn TabularStore>,
        search_feed: Arc<dyn SearchFeed>,
        detail_feed: Arc<dyn DetailFeed>,
        session: Arc<Session>,
    ) -> Self {
        Self {
            identity: identity.into(),
            store,
            search_feed,
            detail_feed,
            session,
        }
    }

    /// Run one full update cycle.
    ///
    /// A feed or store error aborts the remaining steps; the error is
    /// published to the session bus and returned. Teardown failures are
    /// logged and published but never propagated.
    pub async fn run(&self, locations: Vec<String>, queries: Vec<String>) -> Result<()> {
        self.publish(UpdateEvent::RunStarted {
            locations: locations.clone(),
            queries: queries.clone(),
        });

        // Reattach (or first-run create) the user's workbook.
        self.store.attach(&self.identity).await?;

        match self.run_stages(locations, queries).await {
            Ok(()) => {
                self.teardown().await;
                self.publish(UpdateEvent::RunCompleted);
                Ok(())
            }
            Err(e) => {
                self.publish(UpdateEvent::RunFailed {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn run_stages(&self, locations: Vec<String>, queries: Vec<String>) -> Result<()> {
        self.search_stage(queries, locations).await?;
        self.detail_stage().await
    }

    /// Stage 1: pull link batches from the search feed into the search sheet
    async fn search_stage(&self, queries: Vec<String>, locations: Vec<String>) -> Result<()> {
        let (tx, mut rx) = mpsc::channel::<Vec<String>>(FEED_CHANNEL_DEPTH);
        let feed = Arc::clone(&self.search_feed);

        let producer = task::spawn_blocking(move || {
            feed.fetch_links(&queries, &locations, &mut |batch| {
                tx.blocking_send(batch)
                    .map_err(|_| Error::Extraction("search batch consumer dropped".to_string()))
            })
        });

        let mut ingest_result = Ok(());
        while let Some(batch) = rx.recv().await {
            if let Err(e) = self.ingest_search_batch(batch).await {
                ingest_result = Err(e);
                break;
            }
        }
        // Dropping the receiver makes a still-running producer abort on its
        // next send.
        drop(rx);

        let feed_result = producer
            .await
            .map_err(|e| Error::Internal(format!("Search worker panicked: {}", e)))?;
        ingest_result?;
        feed_result
    }

    async fn ingest_search_batch(&self, batch: Vec<String>) -> Result<()> {
        let stamp = Utc::now();
        let scraped = batch.len();
        let items: Vec<BatchItem> = batch.into_iter().map(BatchItem::Link).collect();

        let existing = self
            .store
            .sheet_links(&self.identity, SheetKind::SearchResults)
            .await?;
        let accepted = dedup_batch(items, &existing, Some(&link_not_in));

        self.publish(UpdateEvent::SearchBatch {
            scraped,
            accepted: accepted.len(),
        });

        if !accepted.is_empty() {
            let rows: Vec<Record> = accepted
                .into_iter()
                .map(|item| item.into_record(stamp))
                .collect();
            self.store
                .append_records(&self.identity, SheetKind::SearchResults, &rows)
                .await?;
        }
        Ok(())
    }

    /// Stage 2: fetch postings for every search link without a detail record
    async fn detail_stage(&self) -> Result<()> {
        let search_links = self
            .store
            .sheet_links(&self.identity, SheetKind::SearchResults)
            .await?;
        let posting_links = self
            .store
            .sheet_links(&self.identity, SheetKind::Postings)
            .await?;

        let items: Vec<BatchItem> = search_links.into_iter().map(BatchItem::Link).collect();
        let candidates: Vec<String> = dedup_batch(items, &posting_links, Some(&link_not_in))
            .into_iter()
            .map(|item| item.link().to_string())
            .collect();

        if candidates.is_empty() {
            self.publish(UpdateEvent::NoNewWork);
            return Ok(());
        }
        self.publish(UpdateEvent::DetailCandidates {
            count: candidates.len(),
        });

        let (tx, mut rx) = mpsc::channel::<Vec<Record>>(FEED_CHANNEL_DEPTH);
        let feed = Arc::clone(&self.detail_feed);

        let producer = task::spawn_blocking(move || {
            feed.fetch_records(&candidates, &mut |batch| {
                tx.blocking_send(batch)
                    .map_err(|_| Error::Extraction("detail batch consumer dropped".to_string()))
            })
        });

        let mut ingest_result = Ok(());
        while let Some(batch) = rx.recv().await {
            if let Err(e) = self.ingest_detail_batch(batch).await {
                ingest_result = Err(e);
                break;
            }
        }
        drop(rx);

        let feed_result = producer
            .await
            .map_err(|e| Error::Internal(format!("Detail worker panicked: {}", e)))?;
        ingest_result?;
        feed_result
    }

    async fn ingest_detail_batch(&self, batch: Vec<Record>) -> Result<()> {
        let stamp = Utc::now();
        let scraped = batch.len();
        let items: Vec<BatchItem> = batch
            .into_iter()
            .map(|mut record| {
                record.added_at = stamp;
                BatchItem::Record(record)
            })
            .collect();

        let existing = self
            .store
            .sheet_links(&self.identity, SheetKind::Postings)
            .await?;
        let accepted = dedup_batch(items, &existing, None);

        self.publish(UpdateEvent::DetailBatch {
            scraped,
            accepted: accepted.len(),
        });

        if !accepted.is_empty() {
            let rows: Vec<Record> = accepted
                .into_iter()
                .map(|item| item.into_record(stamp))
                .collect();
            self.store
                .append_records(&self.identity, SheetKind::Postings, &rows)
                .await?;
        }
        Ok(())
    }

    /// Release producer resources; failures are logged, not propagated
    async fn teardown(&self) {
        self.publish(UpdateEvent::CleanupStarted);

        let search_feed = Arc::clone(&self.search_feed);
        let detail_feed = Arc::clone(&self.detail_feed);
        let outcome = task::spawn_blocking(move || {
            let search = search_feed.shutdown();
            let detail = detail_feed.shutdown();
            search.and(detail)
        })
        .await;

        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(e) => Some(format!("Teardown worker panicked: {}", e)),
        };
        if let Some(message) = failure {
            warn!(identity = %self.identity, %message, "Feed teardown failed");
            self.publish(UpdateEvent::CleanupFailed { message });
        }
    }

    fn publish(&self, event: UpdateEvent) {
        let line = event.to_string();
        info!(identity = %self.identity, "{}", line);
        self.session.bus.publish(&line);
    }
}
