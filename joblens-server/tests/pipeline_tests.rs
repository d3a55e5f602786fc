//! Integration tests for the aggregation pipeline
//!
//! Drives full update cycles against the in-memory store with scripted
//! feeds, and checks persistence, cross-stage deduplication, progress
//! publishing, and failure behavior.

use joblens_server::pipeline::testing::{ScriptedDetailFeed, ScriptedSearchFeed};
use joblens_server::pipeline::{Aggregator, DetailFeed, SearchFeed};
use joblens_server::session::{Session, SessionRegistry};
use joblens_server::store::{MemoryStore, TabularStore};
use joblens_common::SheetKind;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

const IDENTITY: &str = "user@example.com";

/// A listing URL carrying a 10-digit listing id
fn link(id: u64) -> String {
    format!("https://jobs.example/jobs/view/role-{:010}/", id)
}

fn session() -> (Arc<Session>, UnboundedReceiver<String>) {
    let registry = SessionRegistry::new();
    let session = registry.get_or_create(IDENTITY);
    let (_, rx) = session.bus.subscribe();
    (session, rx)
}

fn aggregator(
    store: &Arc<MemoryStore>,
    search: &Arc<ScriptedSearchFeed>,
    detail: &Arc<ScriptedDetailFeed>,
    session: Arc<Session>,
) -> Aggregator {
    Aggregator::new(
        IDENTITY,
        Arc::clone(store) as Arc<dyn TabularStore>,
        Arc::clone(search) as Arc<dyn SearchFeed>,
        Arc::clone(detail) as Arc<dyn DetailFeed>,
        session,
    )
}

/// All progress lines published so far, in publish order
fn drain(rx: &mut UnboundedReceiver<String>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Ok(line) = rx.try_recv() {
        lines.push(line);
    }
    lines
}

#[tokio::test]
async fn full_run_persists_search_links_and_postings() {
    let store = Arc::new(MemoryStore::new());
    let search = Arc::new(ScriptedSearchFeed::new(vec![
        vec![link(1), link(2)],
        vec![link(3)],
    ]));
    let detail = Arc::new(ScriptedDetailFeed::new(2, "python and react role"));
    let (session, mut rx) = session();

    aggregator(&store, &search, &detail, session)
        .run(vec!["Warsaw".into()], vec!["rust developer".into()])
        .await
        .unwrap();

    let search_links = store
        .sheet_links(IDENTITY, SheetKind::SearchResults)
        .await
        .unwrap();
    assert_eq!(search_links, vec![link(1), link(2), link(3)]);

    let posting_links = store
        .sheet_links(IDENTITY, SheetKind::Postings)
        .await
        .unwrap();
    assert_eq!(posting_links, vec![link(1), link(2), link(3)]);

    let lines = drain(&mut rx);
    assert_eq!(
        lines.first().map(String::as_str),
        Some("Starting database update with 1 locations and 1 queries")
    );
    assert_eq!(
        lines.last().map(String::as_str),
        Some("Database update completed")
    );
    assert_eq!(search.shutdown_calls.load(Ordering::SeqCst), 1);
    assert_eq!(detail.shutdown_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn duplicate_listing_ids_collapse_within_a_run() {
    let store = Arc::new(MemoryStore::new());
    // The second batch repeats listing 1 under a different URL shape.
    let search = Arc::new(ScriptedSearchFeed::new(vec![
        vec![link(1)],
        vec![
            format!("https://jobs.example/jobs/view/other-title-{:010}", 1),
            link(2),
        ],
    ]));
    let detail = Arc::new(ScriptedDetailFeed::new(10, "irrelevant"));
    let (session, mut rx) = session();

    aggregator(&store, &search, &detail, session)
        .run(vec![], vec!["q".into()])
        .await
        .unwrap();

    let search_links = store
        .sheet_links(IDENTITY, SheetKind::SearchResults)
        .await
        .unwrap();
    assert_eq!(search_links, vec![link(1), link(2)]);

    let lines = drain(&mut rx);
    assert!(lines.contains(&"Scraped 2 job links, adding 1 new links".to_string()));
}

#[tokio::test]
async fn second_run_with_no_new_links_skips_detail_feed() {
    let store = Arc::new(MemoryStore::new());
    let (session, mut rx) = session();

    let first_search = Arc::new(ScriptedSearchFeed::new(vec![vec![link(1), link(2)]]));
    let first_detail = Arc::new(ScriptedDetailFeed::new(10, "first pass"));
    aggregator(&store, &first_search, &first_detail, Arc::clone(&session))
        .run(vec![], vec!["q".into()])
        .await
        .unwrap();
    drain(&mut rx);

    // Replay the same links: nothing new to deduplicate or fetch.
    let second_search = Arc::new(ScriptedSearchFeed::new(vec![vec![link(1), link(2)]]));
    let second_detail = Arc::new(ScriptedDetailFeed::new(10, "second pass"));
    aggregator(&store, &second_search, &second_detail, session)
        .run(vec![], vec!["q".into()])
        .await
        .unwrap();

    assert_eq!(second_detail.fetch_calls.load(Ordering::SeqCst), 0);
    let lines = drain(&mut rx);
    assert!(lines.contains(&"No new job links to fetch".to_string()));
    assert_eq!(
        lines.last().map(String::as_str),
        Some("Database update completed")
    );

    let posting_links = store
        .sheet_links(IDENTITY, SheetKind::Postings)
        .await
        .unwrap();
    assert_eq!(posting_links, vec![link(1), link(2)]);
}

#[tokio::test]
async fn search_failure_keeps_persisted_batches_and_publishes_failure() {
    let store = Arc::new(MemoryStore::new());
    let search = Arc::new(ScriptedSearchFeed::failing_after(
        vec![vec![link(1)], vec![link(2)]],
        1,
    ));
    let detail = Arc::new(ScriptedDetailFeed::new(10, "unused"));
    let (session, mut rx) = session();

    let result = aggregator(&store, &search, &detail, session)
        .run(vec![], vec!["q".into()])
        .await;
    assert!(result.is_err());

    // The batch delivered before the failure stays persisted.
    let search_links = store
        .sheet_links(IDENTITY, SheetKind::SearchResults)
        .await
        .unwrap();
    assert_eq!(search_links, vec![link(1)]);

    // The detail stage never ran, and teardown is skipped on failure.
    assert_eq!(detail.fetch_calls.load(Ordering::SeqCst), 0);
    assert_eq!(search.shutdown_calls.load(Ordering::SeqCst), 0);

    let lines = drain(&mut rx);
    assert!(lines
        .last()
        .unwrap()
        .starts_with("Database update failed:"));
}

#[tokio::test]
async fn detail_failure_preserves_search_sheet() {
    let store = Arc::new(MemoryStore::new());
    let search = Arc::new(ScriptedSearchFeed::new(vec![vec![link(1), link(2)]]));
    let detail = Arc::new(ScriptedDetailFeed::failing(10));
    let (session, mut rx) = session();

    let result = aggregator(&store, &search, &detail, session)
        .run(vec![], vec!["q".into()])
        .await;
    assert!(result.is_err());

    let search_links = store
        .sheet_links(IDENTITY, SheetKind::SearchResults)
        .await
        .unwrap();
    assert_eq!(search_links, vec![link(1), link(2)]);
    assert!(store
        .sheet_links(IDENTITY, SheetKind::Postings)
        .await
        .unwrap()
        .is_empty());

    let lines = drain(&mut rx);
    assert!(lines.contains(&"Found 2 links to fetch postings for".to_string()));
    assert!(lines
        .last()
        .unwrap()
        .starts_with("Database update failed:"));
}

#[tokio::test]
async fn detail_stage_only_requests_links_without_postings() {
    let store = Arc::new(MemoryStore::new());
    let (session, mut rx) = session();

    let first_search = Arc::new(ScriptedSearchFeed::new(vec![vec![link(1)]]));
    let first_detail = Arc::new(ScriptedDetailFeed::new(10, "first"));
    aggregator(&store, &first_search, &first_detail, Arc::clone(&session))
        .run(vec![], vec!["q".into()])
        .await
        .unwrap();
    drain(&mut rx);

    let second_search = Arc::new(ScriptedSearchFeed::new(vec![vec![link(1), link(2)]]));
    let second_detail = Arc::new(ScriptedDetailFeed::new(10, "second"));
    aggregator(&store, &second_search, &second_detail, session)
        .run(vec![], vec!["q".into()])
        .await
        .unwrap();

    let requested = second_detail.requested_links.lock().unwrap().clone();
    assert_eq!(requested, vec![link(2)]);

    let lines = drain(&mut rx);
    assert!(lines.contains(&"Found 1 links to fetch postings for".to_string()));
    assert!(lines.contains(&"Scraped 1 job postings, adding 1 new postings".to_string()));
}

#[tokio::test]
async fn progress_lines_arrive_in_run_order() {
    let store = Arc::new(MemoryStore::new());
    let search = Arc::new(ScriptedSearchFeed::new(vec![vec![link(1)]]));
    let detail = Arc::new(ScriptedDetailFeed::new(10, "x"));
    let (session, mut rx) = session();

    aggregator(&store, &search, &detail, session)
        .run(vec![], vec!["q".into()])
        .await
        .unwrap();

    let lines = drain(&mut rx);
    let position = |needle: &str| {
        lines
            .iter()
            .position(|line| line.starts_with(needle))
            .unwrap_or_else(|| panic!("missing line: {}", needle))
    };

    assert!(position("Starting database update") < position("Scraped 1 job links"));
    assert!(position("Scraped 1 job links") < position("Found 1 links to fetch"));
    assert!(position("Found 1 links to fetch") < position("Scraped 1 job postings"));
    assert!(position("Scraped 1 job postings") < position("Cleaning up feed resources"));
    assert!(position("Cleaning up feed resources") < position("Database update completed"));
}
