//! Document models: crawl candidates, fetched files and extraction outcomes.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::page::PageContext;

/// A PDF link found during a crawl that cleared the relevance threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateDocument {
    /// Resolved absolute PDF URL.
    pub url: String,
    /// Anchor text of the link.
    pub anchor_text: String,
    /// URL of the page the link was found on.
    pub source_page: String,
    /// Classification of the page the link was found on.
    pub context: PageContext,
    /// Total relevance score.
    pub score: u32,
    /// Whether the link was found on a priority page (investors, reports, ...).
    pub from_priority_page: bool,
}

/// Inclusive, 1-based page range of a document chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub first: u32,
    pub last: u32,
}

impl PageRange {
    pub fn new(first: u32, last: u32) -> Self {
        Self { first, last }
    }

    pub fn len(&self) -> u32 {
        self.last.saturating_sub(self.first) + 1
    }

    pub fn is_empty(&self) -> bool {
        self.last < self.first
    }

    pub fn contains(&self, page: u32) -> bool {
        page >= self.first && page <= self.last
    }
}

/// A downloaded document opened for extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedDocument {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub page_count: u32,
    /// Ordered page-range chunks; a single chunk below the split threshold.
    pub chunks: Vec<PageRange>,
}

impl FetchedDocument {
    /// Whether extraction works on split chunk files rather than the original.
    pub fn is_split(&self) -> bool {
        self.chunks.len() > 1
    }
}

/// Strategy used to obtain text from a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionTier {
    Structured,
    Alternate,
    Ocr,
}

impl ExtractionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structured => "structured",
            Self::Alternate => "alternate",
            Self::Ocr => "ocr",
        }
    }
}

impl std::fmt::Display for ExtractionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text obtained from one chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkText {
    pub range: PageRange,
    pub tier: ExtractionTier,
    /// Lowercased tier output.
    pub text: String,
}

/// Result of running the extraction cascade over one document.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    Extracted {
        /// Lowercased concatenation of chunk texts, in chunk order.
        text: String,
        /// Most expensive tier any chunk needed.
        tier: ExtractionTier,
        chunks: Vec<ChunkText>,
    },
    Failed {
        reason: String,
        /// Whole-document attempts made before giving up.
        attempts: u32,
    },
}

impl ExtractionOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Extracted { text, .. } => Some(text),
            Self::Failed { .. } => None,
        }
    }

    pub fn tier(&self) -> Option<ExtractionTier> {
        match self {
            Self::Extracted { tier, .. } => Some(*tier),
            Self::Failed { .. } => None,
        }
    }
}
