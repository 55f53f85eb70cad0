//! Service layer: the mining pipeline behind the CLI.
//!
//! Downloading and per-document processing feed the crawler; the
//! persistence coordinator and batch orchestrator drive whole runs.

pub mod batch;
pub mod download;
pub mod persistence;
pub mod processor;

pub use batch::{BatchEvent, BatchOrchestrator, BatchSettings, CompanyReport};
pub use download::{DownloadError, DownloadStatus, Downloader};
pub use persistence::{PersistenceCoordinator, PersistenceError};
pub use processor::{evaluate_text, FileAnalysis, ProcessError, ProcessOutcome, ReportProcessor};
