//! Progress event types published on the session log bus
//!
//! Each event renders to one plain-text log line; streaming clients receive
//! exactly that line per event.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Progress events emitted during an aggregation run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UpdateEvent {
    /// Update run accepted and starting
    RunStarted {
        locations: Vec<String>,
        queries: Vec<String>,
    },

    /// One search-feed batch was processed
    SearchBatch {
        scraped: usize,
        accepted: usize,
    },

    /// Candidate links selected for the detail stage
    DetailCandidates {
        count: usize,
    },

    /// Every search link already has a detail record
    NoNewWork,

    /// One detail-feed batch was processed
    DetailBatch {
        scraped: usize,
        accepted: usize,
    },

    /// Producer teardown starting
    CleanupStarted,

    /// Producer teardown failed (non-fatal)
    CleanupFailed {
        message: String,
    },

    /// Update run finished successfully
    RunCompleted,

    /// Update run aborted
    RunFailed {
        message: String,
    },
}

impl fmt::Display for UpdateEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateEvent::RunStarted { locations, queries } => write!(
                f,
                "Starting database update with {} locations and {} queries",
                locations.len(),
                queries.len()
            ),
            UpdateEvent::SearchBatch { scraped, accepted } => write!(
                f,
                "Scraped {} job links, adding {} new links",
                scraped, accepted
            ),
            UpdateEvent::DetailCandidates { count } => {
                write!(f, "Found {} links to fetch postings for", count)
            }
            UpdateEvent::NoNewWork => write!(f, "No new job links to fetch"),
            UpdateEvent::DetailBatch { scraped, accepted } => write!(
                f,
                "Scraped {} job postings, adding {} new postings",
                scraped, accepted
            ),
            UpdateEvent::CleanupStarted => write!(f, "Cleaning up feed resources"),
            UpdateEvent::CleanupFailed { message } => {
                write!(f, "Feed cleanup failed: {}", message)
            }
            UpdateEvent::RunCompleted => write!(f, "Database update completed"),
            UpdateEvent::RunFailed { message } => {
                write!(f, "Database update failed: {}", message)
            }
        }
    }
}
