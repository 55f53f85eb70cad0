//! Error ledger record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted download/extraction/navigation failure, keyed by (company_id, url).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub company_id: i32,
    pub url: String,
    pub message: String,
    /// Number of repeated failures after the first.
    pub retry_count: i32,
    pub resolved: bool,
    pub last_attempt: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl ErrorRecord {
    /// Whether the URL is still worth another attempt under `retry_cap`.
    pub fn is_retryable(&self, retry_cap: i32) -> bool {
        !self.resolved && self.retry_count < retry_cap
    }
}
