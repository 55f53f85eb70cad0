//! Page-range chunking of large documents.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use super::ExtractionError;
use crate::models::PageRange;

/// Split `page_count` pages into consecutive ranges of `chunk_pages` pages.
pub fn plan_chunks(page_count: u32, chunk_pages: u32) -> Vec<PageRange> {
    if page_count == 0 {
        return Vec::new();
    }
    let step = if chunk_pages == 0 { page_count } else { chunk_pages };
    (1..=page_count)
        .step_by(step as usize)
        .map(|first| PageRange::new(first, (first + step - 1).min(page_count)))
        .collect()
}

/// A file holding the pages of one chunk.
#[derive(Debug, Clone)]
pub struct ChunkFile {
    pub range: PageRange,
    pub path: PathBuf,
}

/// The chunk files of one document.
///
/// Split chunks live in a temporary directory that is removed by [`ChunkSet::close`]
/// or, failing that, when the set is dropped. An unsplit document is a single
/// chunk pointing at the original file, which is never removed.
#[derive(Debug)]
pub struct ChunkSet {
    files: Vec<ChunkFile>,
    dir: Option<TempDir>,
}

impl ChunkSet {
    /// Treat the whole document as one chunk.
    pub fn whole(path: &Path, page_count: u32) -> Self {
        Self {
            files: vec![ChunkFile {
                range: PageRange::new(1, page_count.max(1)),
                path: path.to_path_buf(),
            }],
            dir: None,
        }
    }

    /// Write one PDF per range into a fresh temporary directory.
    ///
    /// Blocking: parses and rewrites the document with lopdf.
    pub fn split(source: &Path, ranges: &[PageRange]) -> Result<Self, ExtractionError> {
        let document = lopdf::Document::load(source)
            .map_err(|e| ExtractionError::InvalidDocument(e.to_string()))?;
        let dir = tempfile::Builder::new()
            .prefix("assayer-chunks-")
            .tempdir()?;

        let mut files = Vec::with_capacity(ranges.len());
        for range in ranges {
            let mut part = document.clone();
            let outside: Vec<u32> = part
                .get_pages()
                .keys()
                .copied()
                .filter(|page| !range.contains(*page))
                .collect();
            part.delete_pages(&outside);
            part.prune_objects();

            let path = dir
                .path()
                .join(format!("chunk-{:05}-{:05}.pdf", range.first, range.last));
            part.save(&path)
                .map_err(|e| ExtractionError::Split(e.to_string()))?;
            debug!(
                "Wrote chunk {}-{} to {}",
                range.first,
                range.last,
                path.display()
            );
            files.push(ChunkFile {
                range: *range,
                path,
            });
        }

        Ok(Self {
            files,
            dir: Some(dir),
        })
    }

    pub fn files(&self) -> &[ChunkFile] {
        &self.files
    }

    pub fn is_split(&self) -> bool {
        self.dir.is_some()
    }

    /// Remove temporary chunk files, reporting any removal error.
    pub fn close(self) -> std::io::Result<()> {
        match self.dir {
            Some(dir) => dir.close(),
            None => Ok(()),
        }
    }
}
