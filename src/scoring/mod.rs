//! Heuristic scoring of crawled pages and PDF links.
//!
//! The classifier tags visited HTML pages with a [`PageContext`](crate::models::PageContext);
//! the relevance scorer decides which PDF links are worth downloading.

pub mod classifier;
pub mod relevance;

pub use classifier::classify_page;
pub use relevance::{score, RelevanceScore, ELIGIBILITY_THRESHOLD, PRIORITY_KEYWORDS};

/// Lowercase and percent-decode URL or link text for keyword matching.
///
/// Underscores and plus signs become spaces so `gold_reserves.pdf` still hits
/// word-bounded patterns.
pub(crate) fn normalize_for_matching(text: &str) -> String {
    let decoded = urlencoding::decode(text)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| text.to_string());
    decoded
        .to_lowercase()
        .chars()
        .map(|c| if c == '_' || c == '+' { ' ' } else { c })
        .collect()
}
