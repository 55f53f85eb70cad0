//! Data models for assayer.

mod company;
mod crawl_error;
mod document;
mod figures;
mod page;

pub use company::{Company, CrawlTarget, SizeClass, LARGE_MARKET_CAP};
pub use crawl_error::ErrorRecord;
pub use document::{
    CandidateDocument, ChunkText, ExtractionOutcome, ExtractionTier, FetchedDocument, PageRange,
};
pub use figures::{GoldEquivalent, Metal, MinedFigures, QuantityType, ResourceAggregate};
pub use page::{PageContext, PageKind};
