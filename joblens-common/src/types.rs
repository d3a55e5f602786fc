//! Core data model: records, batch items, sheet kinds

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field name used for posting titles
pub const FIELD_TITLE: &str = "title";
/// Field name used for company names
pub const FIELD_COMPANY: &str = "company";
/// Field name used for posting locations
pub const FIELD_LOCATION: &str = "location";
/// Field name used for the long-form description text
pub const FIELD_DESCRIPTION: &str = "description";

/// One accumulated listing record.
///
/// Within one dataset there is at most one Record per extractable listing
/// id; two records sharing an id are considered the same entity regardless
/// of other field differences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Canonical listing URL
    pub link: String,
    /// Free-form attributes (title, company, description, location, ...)
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    /// When this record entered the dataset
    pub added_at: DateTime<Utc>,
}

impl Record {
    /// Create a bare record carrying only a link
    pub fn from_link(link: impl Into<String>, added_at: DateTime<Utc>) -> Self {
        Self {
            link: link.into(),
            fields: BTreeMap::new(),
            added_at,
        }
    }

    /// Field accessor returning "" for absent fields
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }
}

/// One item of a producer batch: either a bare link (search feed) or a full
/// record (detail feed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BatchItem {
    Link(String),
    Record(Record),
}

impl BatchItem {
    /// The listing URL, regardless of variant
    pub fn link(&self) -> &str {
        match self {
            BatchItem::Link(link) => link,
            BatchItem::Record(record) => &record.link,
        }
    }

    /// Convert into a persistable record, stamping bare links with `added_at`
    pub fn into_record(self, added_at: DateTime<Utc>) -> Record {
        match self {
            BatchItem::Link(link) => Record::from_link(link, added_at),
            BatchItem::Record(record) => record,
        }
    }
}

/// The two named sheets each user's Tabular Store holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SheetKind {
    /// Accumulated search links (columns: link, added_at)
    SearchResults,
    /// Full postings (columns: link, title, company, location, description, added_at)
    Postings,
}

impl SheetKind {
    /// Stable sheet title used by store backends and descriptors
    pub fn title(&self) -> &'static str {
        match self {
            SheetKind::SearchResults => "search results",
            SheetKind::Postings => "postings",
        }
    }

    /// Column order for this sheet
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            SheetKind::SearchResults => &["link", "added_at"],
            SheetKind::Postings => &[
                "link",
                FIELD_TITLE,
                FIELD_COMPANY,
                FIELD_LOCATION,
                FIELD_DESCRIPTION,
                "added_at",
            ],
        }
    }
}
