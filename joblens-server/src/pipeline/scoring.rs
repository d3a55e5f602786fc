//! Keyword scoring over persisted postings
//!
//! A posting's score is the number of supplied keywords found (case
//! insensitive substring match) in its description text.

use joblens_common::types::{FIELD_COMPANY, FIELD_DESCRIPTION, FIELD_LOCATION, FIELD_TITLE};
use joblens_common::Record;
use serde::Serialize;

/// One scored posting row
#[derive(Debug, Clone, Serialize)]
pub struct ScoredPosting {
    pub score: usize,
    pub matched_keywords: String,
    pub link: String,
    pub title: String,
    pub company: String,
    pub location: String,
}

/// Score every posting against `keywords`.
///
/// When `location` is supplied, postings are restricted to exact (case
/// sensitive) equality on their location field before scoring. Returns all
/// remaining postings, score 0 included, in dataset order.
pub fn score_postings(
    records: &[Record],
    keywords: &[String],
    location: Option<&str>,
) -> Vec<ScoredPosting> {
    records
        .iter()
        .filter(|record| match location {
            Some(wanted) => record.field(FIELD_LOCATION) == wanted,
            None => true,
        })
        .map(|record| {
            let description = record.field(FIELD_DESCRIPTION).to_lowercase();
            let matched: Vec<&str> = keywords
                .iter()
                .filter(|keyword| description.contains(&keyword.to_lowercase()))
                .map(String::as_str)
                .collect();

            ScoredPosting {
                score: matched.len(),
                matched_keywords: matched.join(", "),
                link: record.link.clone(),
                title: record.field(FIELD_TITLE).to_string(),
                company: record.field(FIELD_COMPANY).to_string(),
                location: record.field(FIELD_LOCATION).to_string(),
            }
        })
        .collect()
}

/// Score postings, keep only those matching at least one keyword, and sort
/// by descending score. Ties keep dataset order (stable sort).
pub fn find_by_keywords(
    records: &[Record],
    keywords: &[String],
    location: Option<&str>,
) -> Vec<ScoredPosting> {
    let mut scored: Vec<ScoredPosting> = score_postings(records, keywords, location)
        .into_iter()
        .filter(|posting| posting.score > 0)
        .collect();
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn posting(link: &str, description: &str, location: &str) -> Record {
        let mut fields = BTreeMap::new();
        fields.insert(FIELD_TITLE.to_string(), "Developer".to_string());
        fields.insert(FIELD_COMPANY.to_string(), "Acme".to_string());
        fields.insert(FIELD_LOCATION.to_string(), location.to_string());
        fields.insert(FIELD_DESCRIPTION.to_string(), description.to_string());
        Record {
            link: link.to_string(),
            fields,
            added_at: Utc::now(),
        }
    }

    fn keywords(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn counts_case_insensitive_matches() {
        let records = vec![posting(
            "https://jobs.example/view/a-1111111111",
            "seeking a python and react developer",
            "Warsaw",
        )];
        let scored = score_postings(&records, &keywords(&["python", "React", "java"]), None);
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].score, 2);
        assert_eq!(scored[0].matched_keywords, "python, React");
    }

    #[test]
    fn score_postings_keeps_zero_scores() {
        let records = vec![
            posting("https://a", "python shop", "Warsaw"),
            posting("https://b", "cobol shop", "Warsaw"),
        ];
        let scored = score_postings(&records, &keywords(&["python"]), None);
        assert_eq!(scored.len(), 2);
        assert_eq!(scored[1].score, 0);
        assert_eq!(scored[1].matched_keywords, "");
    }

    #[test]
    fn find_by_keywords_excludes_zero_and_sorts_descending() {
        let records = vec![
            posting("https://a", "java only", "Warsaw"),
            posting("https://b", "python react azure", "Warsaw"),
            posting("https://c", "python", "Warsaw"),
        ];
        let found = find_by_keywords(&records, &keywords(&["python", "react", "azure"]), None);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].link, "https://b");
        assert_eq!(found[0].score, 3);
        assert_eq!(found[1].link, "https://c");
        assert_eq!(found[1].score, 1);
    }

    #[test]
    fn location_filter_is_exact_and_case_sensitive() {
        let records = vec![
            posting("https://a", "python", "Warsaw"),
            posting("https://b", "python", "warsaw"),
            posting("https://c", "python", "Krakow"),
        ];
        let scored = score_postings(&records, &keywords(&["python"]), Some("Warsaw"));
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].link, "https://a");
    }
}
