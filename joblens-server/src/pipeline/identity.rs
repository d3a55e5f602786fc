//! Listing id extraction
//!
//! Listing URLs carry a stable 10-digit id in their `/view/` path segment;
//! that id is the deduplication key for the whole pipeline.

use once_cell::sync::Lazy;
use regex::Regex;

static LISTING_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/view/.*?-(\d{10})/?").expect("listing id pattern is valid"));

/// Extract the 10-digit listing id from a listing URL.
///
/// Returns `None` for links without the `/view/...-<10 digits>` shape;
/// absence of a match is a normal outcome, not an error.
pub fn extract_listing_id(link: &str) -> Option<&str> {
    LISTING_ID
        .captures(link)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_ten_digit_id() {
        assert_eq!(
            extract_listing_id("https://jobs.example/jobs/view/rust-developer-1234567890"),
            Some("1234567890")
        );
    }

    #[test]
    fn accepts_trailing_slash() {
        assert_eq!(
            extract_listing_id("https://jobs.example/jobs/view/rust-developer-1234567890/"),
            Some("1234567890")
        );
    }

    #[test]
    fn accepts_trailing_query_segment() {
        assert_eq!(
            extract_listing_id("https://jobs.example/jobs/view/dev-9876543210/?ref=feed"),
            Some("9876543210")
        );
    }

    #[test]
    fn rejects_short_ids() {
        assert_eq!(
            extract_listing_id("https://jobs.example/jobs/view/rust-developer-12345"),
            None
        );
    }

    #[test]
    fn rejects_links_without_view_segment() {
        assert_eq!(
            extract_listing_id("https://jobs.example/company/rust-developer-1234567890"),
            None
        );
        assert_eq!(extract_listing_id(""), None);
        assert_eq!(extract_listing_id("not a url at all"), None);
    }
}
