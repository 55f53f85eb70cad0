//! Tiered text extraction from downloaded PDF documents.
//!
//! A document is first opened to check it is a well-formed PDF, optionally split
//! into page-range chunks, then each chunk is run through the tiers in order
//! (structured text layer, per-page alternate text layer, first-page OCR) until
//! one produces text.

pub mod cascade;
pub mod chunker;
pub mod tiers;

#[cfg(test)]
pub(crate) mod testing;

use thiserror::Error;

pub use cascade::ExtractionCascade;
pub use chunker::{plan_chunks, ChunkFile, ChunkSet};
pub use tiers::{AlternateTier, OcrTier, StructuredTier, TextTier};

use crate::models::{ExtractionTier, PageRange};

/// Errors that can occur during text extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("{0} tier produced no text")]
    EmptyText(ExtractionTier),

    #[error("{tier} tier timed out after {secs}s")]
    Timeout { tier: ExtractionTier, secs: u64 },

    #[error("Failed to split document: {0}")]
    Split(String),

    #[error("All tiers failed for pages {}-{}: {reasons}", .range.first, .range.last)]
    AllTiersFailed { range: PageRange, reasons: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractionError {
    /// Whether retrying the document could help.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidDocument(_))
    }
}
