//! External producer feeds
//!
//! The scraping engine is an external collaborator reached through a
//! "produce a batch, then callback" boundary. Feed implementations are
//! blocking; the aggregator runs them on worker threads and bridges their
//! batches onto the async side. Feeds deliver flat batches in order.

use chrono::Utc;
use joblens_common::types::{FIELD_COMPANY, FIELD_DESCRIPTION, FIELD_LOCATION, FIELD_TITLE};
use joblens_common::{Error, Record, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// How many links one detail request asks for
const DETAIL_BATCH_SIZE: usize = 20;
/// Upstream request timeout
const FEED_TIMEOUT: Duration = Duration::from_secs(120);

/// Producer of search-result link batches
pub trait SearchFeed: Send + Sync {
    /// Run one search round for the given queries/locations, invoking
    /// `on_batch` once per produced batch, in production order.
    fn fetch_links(
        &self,
        queries: &[String],
        locations: &[String],
        on_batch: &mut dyn FnMut(Vec<String>) -> Result<()>,
    ) -> Result<()>;

    /// Release producer resources
    fn shutdown(&self) -> Result<()>;
}

/// Producer of full posting-record batches
pub trait DetailFeed: Send + Sync {
    /// Fetch detail records for `links`, invoking `on_batch` once per
    /// produced batch, in production order.
    fn fetch_records(
        &self,
        links: &[String],
        on_batch: &mut dyn FnMut(Vec<Record>) -> Result<()>,
    ) -> Result<()>;

    /// Release producer resources
    fn shutdown(&self) -> Result<()>;
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    queries: &'a [String],
    locations: &'a [String],
    cursor: Option<String>,
}

#[derive(Deserialize)]
struct SearchResponse {
    links: Vec<String>,
    next_cursor: Option<String>,
}

#[derive(Serialize)]
struct DetailRequest<'a> {
    links: &'a [String],
}

#[derive(Deserialize)]
struct DetailResponse {
    postings: Vec<UpstreamPosting>,
}

#[derive(Deserialize)]
struct UpstreamPosting {
    link: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    company: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    description: String,
}

impl From<UpstreamPosting> for Record {
    fn from(posting: UpstreamPosting) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(FIELD_TITLE.to_string(), posting.title);
        fields.insert(FIELD_COMPANY.to_string(), posting.company);
        fields.insert(FIELD_LOCATION.to_string(), posting.location);
        fields.insert(FIELD_DESCRIPTION.to_string(), posting.description);
        Record {
            link: posting.link,
            fields,
            // Provisional; the pipeline stamps records at ingest time.
            added_at: Utc::now(),
        }
    }
}

/// Search feed backed by an upstream extraction service over HTTP
pub struct HttpSearchFeed {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpSearchFeed {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(FEED_TIMEOUT)
            .build()
            .map_err(|e| Error::Extraction(format!("Cannot build feed client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

impl SearchFeed for HttpSearchFeed {
    fn fetch_links(
        &self,
        queries: &[String],
        locations: &[String],
        on_batch: &mut dyn FnMut(Vec<String>) -> Result<()>,
    ) -> Result<()> {
        let mut cursor: Option<String> = None;
        loop {
            let response: SearchResponse = self
                .client
                .post(format!("{}/search", self.base_url))
                .json(&SearchRequest {
                    queries,
                    locations,
                    cursor: cursor.clone(),
                })
                .send()
                .and_then(reqwest::blocking::Response::error_for_status)
                .map_err(|e| Error::Extraction(format!("Search feed request failed: {}", e)))?
                .json()
                .map_err(|e| Error::Extraction(format!("Malformed search feed response: {}", e)))?;

            debug!(links = response.links.len(), "Search feed batch received");
            if !response.links.is_empty() {
                on_batch(response.links)?;
            }

            match response.next_cursor {
                Some(next) => cursor = Some(next),
                None => return Ok(()),
            }
        }
    }

    fn shutdown(&self) -> Result<()> {
        self.client
            .post(format!("{}/shutdown", self.base_url))
            .send()
            .map_err(|e| Error::Extraction(format!("Search feed shutdown failed: {}", e)))?;
        Ok(())
    }
}

/// Detail feed backed by an upstream extraction service over HTTP
pub struct HttpDetailFeed {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpDetailFeed {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(FEED_TIMEOUT)
            .build()
            .map_err(|e| Error::Extraction(format!("Cannot build feed client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

impl DetailFeed for HttpDetailFeed {
    fn fetch_records(
        &self,
        links: &[String],
        on_batch: &mut dyn FnMut(Vec<Record>) -> Result<()>,
    ) -> Result<()> {
        for chunk in links.chunks(DETAIL_BATCH_SIZE) {
            let response: DetailResponse = self
                .client
                .post(format!("{}/postings", self.base_url))
                .json(&DetailRequest { links: chunk })
                .send()
                .and_then(reqwest::blocking::Response::error_for_status)
                .map_err(|e| Error::Extraction(format!("Detail feed request failed: {}", e)))?
                .json()
                .map_err(|e| Error::Extraction(format!("Malformed detail feed response: {}", e)))?;

            debug!(postings = response.postings.len(), "Detail feed batch received");
            let records: Vec<Record> = response.postings.into_iter().map(Record::from).collect();
            if !records.is_empty() {
                on_batch(records)?;
            }
        }
        Ok(())
    }

    fn shutdown(&self) -> Result<()> {
        self.client
            .post(format!("{}/shutdown", self.base_url))
            .send()
            .map_err(|e| Error::Extraction(format!("Detail feed shutdown failed: {}", e)))?;
        Ok(())
    }
}
