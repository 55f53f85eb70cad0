//! The extraction cascade.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::chunker::{plan_chunks, ChunkFile, ChunkSet};
use super::tiers::{AlternateTier, OcrTier, StructuredTier, TextTier};
use super::ExtractionError;
use crate::config::ExtractionSettings;
use crate::models::{ChunkText, ExtractionOutcome, ExtractionTier, FetchedDocument, PageRange};

/// Runs documents through the extraction tiers in order.
#[derive(Clone)]
pub struct ExtractionCascade {
    tiers: Vec<Arc<dyn TextTier>>,
    settings: ExtractionSettings,
}

impl ExtractionCascade {
    /// Create a cascade with the structured, alternate and OCR tiers.
    pub fn new(settings: ExtractionSettings) -> Self {
        let tiers: Vec<Arc<dyn TextTier>> = vec![
            Arc::new(StructuredTier),
            Arc::new(AlternateTier),
            Arc::new(OcrTier::new(&settings.tesseract_lang, settings.ocr_dpi)),
        ];
        Self::with_tiers(tiers, settings)
    }

    /// Create a cascade with custom tiers, tried in the given order.
    pub fn with_tiers(tiers: Vec<Arc<dyn TextTier>>, settings: ExtractionSettings) -> Self {
        Self { tiers, settings }
    }

    pub fn settings(&self) -> &ExtractionSettings {
        &self.settings
    }

    /// Open a PDF, checking it is well formed and planning its chunks.
    pub async fn open(&self, path: &Path) -> Result<FetchedDocument, ExtractionError> {
        let size_bytes = tokio::fs::metadata(path).await?.len();

        let load_path = path.to_path_buf();
        let page_count = tokio::task::spawn_blocking(move || {
            lopdf::Document::load(&load_path).map(|doc| doc.get_pages().len() as u32)
        })
        .await
        .map_err(|e| ExtractionError::InvalidDocument(e.to_string()))?
        .map_err(|e| ExtractionError::InvalidDocument(e.to_string()))?;

        let chunks = if size_bytes > self.settings.split_threshold_bytes {
            plan_chunks(page_count, self.settings.chunk_pages)
        } else {
            vec![PageRange::new(1, page_count.max(1))]
        };

        Ok(FetchedDocument {
            path: path.to_path_buf(),
            size_bytes,
            page_count,
            chunks,
        })
    }

    /// Open and extract a file. Structurally invalid files fail without any
    /// tier being attempted.
    pub async fn extract_file(&self, path: &Path) -> ExtractionOutcome {
        match self.open(path).await {
            Ok(document) => self.extract(&document).await,
            Err(e) => {
                warn!(
                    category = "extraction",
                    path = %path.display(),
                    "Rejected document: {}",
                    e
                );
                ExtractionOutcome::Failed {
                    reason: e.to_string(),
                    attempts: 0,
                }
            }
        }
    }

    /// Extract text from an opened document, retrying the whole document
    /// with backoff when every tier fails on some chunk.
    pub async fn extract(&self, document: &FetchedDocument) -> ExtractionOutcome {
        let max_attempts = self.settings.retries + 1;
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            match self.attempt(document).await {
                Ok(outcome) => {
                    if let Some(tier) = outcome.tier() {
                        info!(
                            path = %document.path.display(),
                            tier = tier.as_str(),
                            chunks = document.chunks.len(),
                            "Extracted text"
                        );
                    }
                    return outcome;
                }
                Err(e) if !e.is_retryable() => {
                    warn!(category = "extraction", path = %document.path.display(), "{}", e);
                    return ExtractionOutcome::Failed {
                        reason: e.to_string(),
                        attempts: attempt,
                    };
                }
                Err(e) => {
                    warn!(
                        category = "extraction",
                        path = %document.path.display(),
                        attempt,
                        max_attempts,
                        "Extraction attempt failed: {}",
                        e
                    );
                    last_error = Some(e);
                    if attempt < max_attempts {
                        tokio::time::sleep(self.settings.retry_backoff(attempt)).await;
                    }
                }
            }
        }

        ExtractionOutcome::Failed {
            reason: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no extraction attempted".to_string()),
            attempts: max_attempts,
        }
    }

    /// One pass over all chunks. Chunk files are removed before returning.
    async fn attempt(&self, document: &FetchedDocument) -> Result<ExtractionOutcome, ExtractionError> {
        let chunk_set = if document.is_split() {
            let source = document.path.clone();
            let ranges = document.chunks.clone();
            tokio::task::spawn_blocking(move || ChunkSet::split(&source, &ranges))
                .await
                .map_err(|e| ExtractionError::Split(e.to_string()))??
        } else {
            ChunkSet::whole(&document.path, document.page_count)
        };

        let budget = self.settings.tier_timeout(document.size_bytes);
        let mut chunks = Vec::with_capacity(chunk_set.files().len());
        let mut failure = None;
        for file in chunk_set.files() {
            match self.extract_chunk(file, budget).await {
                Ok(chunk) => chunks.push(chunk),
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        if let Err(e) = chunk_set.close() {
            warn!("Failed to remove chunk files: {}", e);
        }
        if let Some(e) = failure {
            return Err(e);
        }

        let tier = chunks
            .iter()
            .map(|c| c.tier)
            .max()
            .unwrap_or(ExtractionTier::Structured);
        let text: String = chunks.iter().map(|c| c.text.as_str()).collect();

        Ok(ExtractionOutcome::Extracted { text, tier, chunks })
    }

    /// Try each tier on one chunk until one yields non-empty text.
    async fn extract_chunk(&self, chunk: &ChunkFile, budget: Duration) -> Result<ChunkText, ExtractionError> {
        let mut reasons = Vec::new();

        for tier in &self.tiers {
            let tag = tier.tier();
            let error = match tokio::time::timeout(budget, tier.extract(&chunk.path)).await {
                Ok(Ok(text)) if !text.trim().is_empty() => {
                    return Ok(ChunkText {
                        range: chunk.range,
                        tier: tag,
                        text: text.to_lowercase(),
                    });
                }
                Ok(Ok(_)) => ExtractionError::EmptyText(tag),
                Ok(Err(e)) => e,
                Err(_) => ExtractionError::Timeout {
                    tier: tag,
                    secs: budget.as_secs(),
                },
            };
            debug!(
                pages = %format!("{}-{}", chunk.range.first, chunk.range.last),
                tier = tag.as_str(),
                "Tier failed: {}",
                error
            );
            reasons.push(format!("{}: {}", tag, error));
        }

        Err(ExtractionError::AllTiersFailed {
            range: chunk.range,
            reasons: reasons.join("; "),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::testing::write_pdf;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    enum Behavior {
        Fail,
        Empty,
        Text(&'static str),
        Hang,
    }

    struct StubTier {
        tag: ExtractionTier,
        behavior: Behavior,
        calls: AtomicUsize,
    }

    impl StubTier {
        fn new(tag: ExtractionTier, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                tag,
                behavior,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl TextTier for StubTier {
        fn tier(&self) -> ExtractionTier {
            self.tag
        }

        async fn extract(&self, _path: &Path) -> Result<String, ExtractionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                Behavior::Fail => Err(ExtractionError::ExtractionFailed("stub".to_string())),
                Behavior::Empty => Ok("   \n".to_string()),
                Behavior::Text(text) => Ok(text.to_string()),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok("too late".to_string())
                }
            }
        }
    }

    /// Records every path it is called with and echoes the file name.
    struct RecordingTier {
        seen: Mutex<Vec<std::path::PathBuf>>,
    }

    #[async_trait]
    impl TextTier for RecordingTier {
        fn tier(&self) -> ExtractionTier {
            ExtractionTier::Structured
        }

        async fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
            assert!(path.exists());
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(path.to_path_buf());
            }
            Ok(format!(
                "[{}]",
                path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
            ))
        }
    }

    fn fast_settings() -> ExtractionSettings {
        ExtractionSettings {
            small_timeout_secs: 1,
            large_timeout_secs: 1,
            retries: 1,
            retry_backoff_ms: 0,
            ..ExtractionSettings::default()
        }
    }

    fn sample(pages: u32) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        write_pdf(&path, pages);
        (dir, path)
    }

    #[tokio::test]
    async fn test_first_successful_tier_wins() {
        let (_dir, path) = sample(2);
        let structured = StubTier::new(ExtractionTier::Structured, Behavior::Text("Gold Reserves"));
        let ocr = StubTier::new(ExtractionTier::Ocr, Behavior::Text("unused"));
        let cascade = ExtractionCascade::with_tiers(
            vec![
                structured.clone() as Arc<dyn TextTier>,
                ocr.clone() as Arc<dyn TextTier>,
            ],
            fast_settings(),
        );

        let outcome = cascade.extract_file(&path).await;
        assert_eq!(outcome.text(), Some("gold reserves"));
        assert_eq!(outcome.tier(), Some(ExtractionTier::Structured));
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_falls_through_failed_and_empty_tiers() {
        let (_dir, path) = sample(1);
        let cascade = ExtractionCascade::with_tiers(
            vec![
                StubTier::new(ExtractionTier::Structured, Behavior::Fail) as Arc<dyn TextTier>,
                StubTier::new(ExtractionTier::Alternate, Behavior::Empty) as Arc<dyn TextTier>,
                StubTier::new(ExtractionTier::Ocr, Behavior::Text("SCANNED")) as Arc<dyn TextTier>,
            ],
            fast_settings(),
        );

        let outcome = cascade.extract_file(&path).await;
        assert_eq!(outcome.text(), Some("scanned"));
        assert_eq!(outcome.tier(), Some(ExtractionTier::Ocr));
    }

    #[tokio::test]
    async fn test_timeout_falls_through() {
        let (_dir, path) = sample(1);
        let cascade = ExtractionCascade::with_tiers(
            vec![
                StubTier::new(ExtractionTier::Structured, Behavior::Hang) as Arc<dyn TextTier>,
                StubTier::new(ExtractionTier::Alternate, Behavior::Text("layer two")) as Arc<dyn TextTier>,
            ],
            fast_settings(),
        );

        let outcome = cascade.extract_file(&path).await;
        assert_eq!(outcome.tier(), Some(ExtractionTier::Alternate));
    }

    #[tokio::test]
    async fn test_exhaustion_retries_whole_document() {
        let (_dir, path) = sample(1);
        let failing = StubTier::new(ExtractionTier::Structured, Behavior::Fail);
        let cascade = ExtractionCascade::with_tiers(vec![failing.clone() as Arc<dyn TextTier>], fast_settings());

        let outcome = cascade.extract_file(&path).await;
        match outcome {
            ExtractionOutcome::Failed { attempts, .. } => assert_eq!(attempts, 2),
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(failing.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalid_document_attempts_no_tier() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.pdf");
        std::fs::write(&path, b"<html>not a pdf</html>").unwrap();
        let tier = StubTier::new(ExtractionTier::Structured, Behavior::Text("x"));
        let cascade = ExtractionCascade::with_tiers(vec![tier.clone() as Arc<dyn TextTier>], fast_settings());

        let outcome = cascade.extract_file(&path).await;
        assert!(matches!(outcome, ExtractionOutcome::Failed { attempts: 0, .. }));
        assert_eq!(tier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_split_chunks_are_concatenated_and_removed() {
        let (_dir, path) = sample(5);
        let recorder = Arc::new(RecordingTier {
            seen: Mutex::new(Vec::new()),
        });
        let settings = ExtractionSettings {
            split_threshold_bytes: 0,
            chunk_pages: 2,
            ..fast_settings()
        };
        let cascade = ExtractionCascade::with_tiers(vec![recorder.clone() as Arc<dyn TextTier>], settings);

        let document = cascade.open(&path).await.unwrap();
        assert_eq!(document.page_count, 5);
        assert_eq!(document.chunks.len(), 3);

        let outcome = cascade.extract(&document).await;
        let ExtractionOutcome::Extracted { text, chunks, .. } = outcome else {
            panic!("expected extracted text");
        };
        assert_eq!(chunks.len(), 3);
        assert_eq!(text.len(), chunks.iter().map(|c| c.text.len()).sum::<usize>());
        assert!(text.starts_with("[chunk-00001-00002.pdf]"));

        let seen = recorder.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|p| !p.exists()));
        assert!(path.exists());
    }
}
