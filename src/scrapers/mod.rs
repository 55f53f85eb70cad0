//! Website traversal: HTTP fetching, link extraction and the site crawler.

pub mod crawler;
mod http_client;
pub mod links;
pub mod visited;

pub use crawler::{CrawlReport, DocumentProcessor, MinedDocument, PageFetcher, SiteCrawler};
pub use http_client::{resolve_user_agent, HttpClient, HttpResponse, USER_AGENT};
pub use links::{extract_links, is_pdf_url, Link, PageLinks};
pub use visited::{normalize_url, VisitedSet};

use thiserror::Error;

/// Errors fetching a page or document over HTTP.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Not an HTML page ({content_type}): {url}")]
    NotHtml { url: String, content_type: String },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl FetchError {
    /// Whether the failure may go away on a later attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Request(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Client(_) | Self::NotHtml { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transience() {
        let busy = FetchError::Status {
            url: "https://a.example".to_string(),
            status: 503,
        };
        let gone = FetchError::Status {
            url: "https://a.example".to_string(),
            status: 404,
        };
        assert!(busy.is_transient());
        assert!(!gone.is_transient());
    }
}
