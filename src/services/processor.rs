//! Per-document pipeline: download, extract, mine, validate.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::download::{DownloadError, Downloader};
use crate::extraction::ExtractionCascade;
use crate::mining::{gold_equivalent, mine, validate, ValidationError};
use crate::models::{
    CandidateDocument, CrawlTarget, ExtractionOutcome, ExtractionTier, GoldEquivalent,
    MinedFigures,
};
use crate::scrapers::DocumentProcessor;
use crate::utils::document_filename;

/// What came out of a successfully extracted document.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    /// Figures passed validation and may be persisted.
    Accepted(MinedFigures),
    /// Figures were mined but failed validation.
    Rejected(ValidationError),
    /// The text held no recognizable figures.
    NoFigures,
}

/// Failures that belong in the error ledger.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("Extraction failed after {attempts} attempt(s): {reason}")]
    Extraction { reason: String, attempts: u32 },
}

/// Mine and validate extracted text for a company.
pub fn evaluate_text(text: &str, description: &str) -> (MinedFigures, GoldEquivalent, ProcessOutcome) {
    let figures = mine(text);
    let aueq = gold_equivalent(&figures);
    if figures.is_empty() {
        return (figures, aueq, ProcessOutcome::NoFigures);
    }
    let outcome = match validate(&figures, &aueq, description) {
        Ok(()) => ProcessOutcome::Accepted(figures),
        Err(e) => ProcessOutcome::Rejected(e),
    };
    (figures, aueq, outcome)
}

/// Result of analyzing a local file.
#[derive(Debug, Clone)]
pub struct FileAnalysis {
    pub tier: ExtractionTier,
    pub text_chars: usize,
    pub figures: MinedFigures,
    pub gold_equivalent: GoldEquivalent,
    pub outcome: ProcessOutcome,
}

/// Downloads candidates into the documents directory and runs them through
/// extraction, mining and validation.
pub struct ReportProcessor {
    downloader: Downloader,
    cascade: ExtractionCascade,
    documents_dir: PathBuf,
}

impl ReportProcessor {
    pub fn new(downloader: Downloader, cascade: ExtractionCascade, documents_dir: PathBuf) -> Self {
        Self {
            downloader,
            cascade,
            documents_dir,
        }
    }

    /// Extract, mine and validate a PDF already on disk.
    pub async fn analyze_file(
        cascade: &ExtractionCascade,
        path: &Path,
        description: &str,
    ) -> Result<FileAnalysis, ProcessError> {
        match cascade.extract_file(path).await {
            ExtractionOutcome::Extracted { text, tier, .. } => {
                let (figures, gold_equivalent, outcome) = evaluate_text(&text, description);
                Ok(FileAnalysis {
                    tier,
                    text_chars: text.chars().count(),
                    figures,
                    gold_equivalent,
                    outcome,
                })
            }
            ExtractionOutcome::Failed { reason, attempts } => {
                Err(ProcessError::Extraction { reason, attempts })
            }
        }
    }
}

#[async_trait]
impl DocumentProcessor for ReportProcessor {
    async fn process(
        &self,
        target: &CrawlTarget,
        candidate: &CandidateDocument,
    ) -> Result<ProcessOutcome, ProcessError> {
        let filename =
            document_filename(&target.ticker, &candidate.url, candidate.from_priority_page);
        let path = self.documents_dir.join(filename);

        self.downloader.fetch(&candidate.url, &path).await?;

        let analysis = Self::analyze_file(&self.cascade, &path, &target.description).await?;
        match &analysis.outcome {
            ProcessOutcome::Accepted(_) => info!(
                company_id = target.company_id,
                url = %candidate.url,
                tier = analysis.tier.as_str(),
                "Accepted figures"
            ),
            ProcessOutcome::Rejected(e) => warn!(
                category = "validation",
                company_id = target.company_id,
                url = %candidate.url,
                "Rejected figures: {}",
                e
            ),
            ProcessOutcome::NoFigures => debug!(
                company_id = target.company_id,
                url = %candidate.url,
                "No figures found"
            ),
        }
        Ok(analysis.outcome)
    }
}
