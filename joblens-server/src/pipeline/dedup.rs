//! Batch deduplication against an accumulated dataset
//!
//! Filters a producer batch so that no accepted item shares a listing id
//! with the existing dataset or with an item accepted earlier in the same
//! batch. Items without an extractable id fall back to an optional
//! caller-supplied predicate over the original dataset snapshot.

use super::identity::extract_listing_id;
use joblens_common::BatchItem;
use std::collections::HashSet;

/// Fallback predicate for items without an extractable listing id.
///
/// Receives the item and the original existing-link snapshot; returns true
/// to keep the item.
pub type FallbackFilter<'a> = dyn Fn(&BatchItem, &[String]) -> bool + 'a;

/// Keep a link only when it is not already in the existing snapshot.
/// The usual fallback for the search stage.
pub fn link_not_in(item: &BatchItem, existing_links: &[String]) -> bool {
    !existing_links.iter().any(|link| link == item.link())
}

/// Filter `new_items` against `existing_links`, preserving order.
///
/// The existing snapshot is read once at call time; ids seen in accepted
/// items extend the working set so a batch never yields two items with the
/// same id. Items without an id are kept only if `fallback` approves them
/// against the original snapshot; no fallback means they are dropped.
pub fn dedup_batch(
    new_items: Vec<BatchItem>,
    existing_links: &[String],
    fallback: Option<&FallbackFilter>,
) -> Vec<BatchItem> {
    let mut seen_ids: HashSet<String> = existing_links
        .iter()
        .filter_map(|link| extract_listing_id(link))
        .map(str::to_owned)
        .collect();

    let mut accepted = Vec::new();
    for item in new_items {
        match extract_listing_id(item.link()) {
            Some(id) => {
                if !seen_ids.contains(id) {
                    seen_ids.insert(id.to_owned());
                    accepted.push(item);
                }
            }
            None => {
                if let Some(keep) = fallback {
                    if keep(&item, existing_links) {
                        accepted.push(item);
                    }
                }
            }
        }
    }
    accepted
}
