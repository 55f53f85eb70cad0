//! Chunked extraction of large documents.

mod common;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use assayer::config::ExtractionSettings;
use assayer::extraction::{ExtractionCascade, ExtractionError, TextTier};
use assayer::models::{ExtractionOutcome, ExtractionTier};
use async_trait::async_trait;
use common::write_pdf;
use tempfile::tempdir;

/// Records the chunk files it sees. Fails on the chunk whose file name
/// contains `fail_on`, if set.
struct ChunkRecorder {
    tag: ExtractionTier,
    fail_on: Option<&'static str>,
    seen: Mutex<Vec<PathBuf>>,
}

impl ChunkRecorder {
    fn new(tag: ExtractionTier, fail_on: Option<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            tag,
            fail_on,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn seen(&self) -> Vec<PathBuf> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextTier for ChunkRecorder {
    fn tier(&self) -> ExtractionTier {
        self.tag
    }

    async fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        assert!(path.exists());
        self.seen.lock().unwrap().push(path.to_path_buf());

        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if self.fail_on.is_some_and(|marker| name.contains(marker)) {
            return Err(ExtractionError::ExtractionFailed("unreadable chunk".to_string()));
        }
        Ok(format!("Text Of {};", name))
    }
}

fn chunked_settings() -> ExtractionSettings {
    ExtractionSettings {
        split_threshold_bytes: 0,
        chunk_pages: 4,
        retries: 0,
        retry_backoff_ms: 0,
        ..ExtractionSettings::default()
    }
}

#[tokio::test]
async fn test_large_document_is_split_and_chunks_removed() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("annual-report.pdf");
    write_pdf(&path, 10);

    let recorder = ChunkRecorder::new(ExtractionTier::Structured, None);
    let cascade = ExtractionCascade::with_tiers(
        vec![recorder.clone() as Arc<dyn TextTier>],
        chunked_settings(),
    );

    let outcome = cascade.extract_file(&path).await;
    let ExtractionOutcome::Extracted { text, tier, chunks } = outcome else {
        panic!("expected extracted text");
    };

    assert_eq!(tier, ExtractionTier::Structured);
    assert_eq!(chunks.len(), 3);
    assert_eq!(
        chunks.iter().map(|c| (c.range.first, c.range.last)).collect::<Vec<_>>(),
        vec![(1, 4), (5, 8), (9, 10)]
    );
    assert_eq!(text.len(), chunks.iter().map(|c| c.text.len()).sum::<usize>());
    // Lowercased, in chunk order
    assert_eq!(
        text,
        "text of chunk-00001-00004.pdf;text of chunk-00005-00008.pdf;text of chunk-00009-00010.pdf;"
    );

    let seen = recorder.seen();
    assert_eq!(seen.len(), 3);
    assert!(seen.iter().all(|p| p != &path));
    assert!(seen.iter().all(|p| !p.exists()));
    assert!(path.exists());
}

#[tokio::test]
async fn test_chunks_removed_when_a_chunk_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("annual-report.pdf");
    write_pdf(&path, 10);

    let recorder = ChunkRecorder::new(ExtractionTier::Structured, Some("00005"));
    let cascade = ExtractionCascade::with_tiers(
        vec![recorder.clone() as Arc<dyn TextTier>],
        chunked_settings(),
    );

    let outcome = cascade.extract_file(&path).await;
    assert!(outcome.is_failure());

    let seen = recorder.seen();
    assert_eq!(seen.len(), 2);
    assert!(seen.iter().all(|p| !p.exists()));
}

#[tokio::test]
async fn test_later_tier_covers_failed_chunk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scanned.pdf");
    write_pdf(&path, 8);

    let structured = ChunkRecorder::new(ExtractionTier::Structured, Some("00005"));
    let ocr = ChunkRecorder::new(ExtractionTier::Ocr, None);
    let cascade = ExtractionCascade::with_tiers(
        vec![
            structured.clone() as Arc<dyn TextTier>,
            ocr.clone() as Arc<dyn TextTier>,
        ],
        chunked_settings(),
    );

    let outcome = cascade.extract_file(&path).await;
    let ExtractionOutcome::Extracted { tier, chunks, .. } = outcome else {
        panic!("expected extracted text");
    };

    // The most expensive tier used by any chunk
    assert_eq!(tier, ExtractionTier::Ocr);
    assert_eq!(chunks[0].tier, ExtractionTier::Structured);
    assert_eq!(chunks[1].tier, ExtractionTier::Ocr);
    assert_eq!(ocr.seen().len(), 1);
}
