//! Aggregation pipeline: identity extraction, deduplication, feeds,
//! orchestration, and keyword scoring

pub mod aggregator;
pub mod dedup;
pub mod feeds;
pub mod identity;
pub mod scoring;
pub mod testing;

pub use aggregator::Aggregator;
pub use feeds::{DetailFeed, HttpDetailFeed, HttpSearchFeed, SearchFeed};
