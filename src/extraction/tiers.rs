//! Extraction tiers.
//!
//! Each tier turns a PDF file into text or fails with a reason. The cascade
//! decides ordering and timeouts; tiers only do the work.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::process::Command;

use super::ExtractionError;
use crate::models::ExtractionTier;

/// A strategy for obtaining text from a PDF file.
#[async_trait]
pub trait TextTier: Send + Sync {
    fn tier(&self) -> ExtractionTier;

    /// Extract text from the PDF at `path`. Empty output is not an error here.
    async fn extract(&self, path: &Path) -> Result<String, ExtractionError>;
}

/// Handle command output, extracting stdout on success or returning appropriate error.
fn handle_cmd_output(
    result: std::io::Result<std::process::Output>,
    tool_name: &str,
    error_prefix: &str,
) -> Result<String, ExtractionError> {
    match result {
        Ok(output) if output.status.success() => {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        }
        Ok(output) => Err(ExtractionError::ExtractionFailed(format!(
            "{}: {}",
            error_prefix,
            String::from_utf8_lossy(&output.stderr).trim()
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ExtractionError::ToolNotFound(tool_name.to_string()))
        }
        Err(e) => Err(ExtractionError::Io(e)),
    }
}

/// Text-layer extraction with the pdf-extract library.
#[derive(Debug, Default, Clone)]
pub struct StructuredTier;

#[async_trait]
impl TextTier for StructuredTier {
    fn tier(&self) -> ExtractionTier {
        ExtractionTier::Structured
    }

    async fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        let path = path.to_path_buf();
        // pdf-extract can panic on malformed input; the join error catches it.
        tokio::task::spawn_blocking(move || pdf_extract::extract_text(&path))
            .await
            .map_err(|e| ExtractionError::ExtractionFailed(format!("pdf-extract aborted: {}", e)))?
            .map_err(|e| ExtractionError::ExtractionFailed(format!("pdf-extract: {}", e)))
    }
}

/// Page-by-page text-layer extraction with poppler's pdftotext.
#[derive(Debug, Default, Clone)]
pub struct AlternateTier;

impl AlternateTier {
    /// Get the page count of a PDF from pdfinfo.
    pub async fn page_count(path: &Path) -> Option<u32> {
        let output = Command::new("pdfinfo")
            .arg(path)
            .kill_on_drop(true)
            .output()
            .await
            .ok()?;
        if !output.status.success() {
            return None;
        }
        parse_pdfinfo_pages(&String::from_utf8_lossy(&output.stdout))
    }

    /// Run pdftotext on one page.
    pub async fn page_text(path: &Path, page: u32) -> Result<String, ExtractionError> {
        let page_str = page.to_string();
        let output = Command::new("pdftotext")
            .args(["-layout", "-enc", "UTF-8", "-f", &page_str, "-l", &page_str])
            .arg(path)
            .arg("-")
            .kill_on_drop(true)
            .output()
            .await;

        handle_cmd_output(
            output,
            "pdftotext (install poppler-utils)",
            &format!("pdftotext failed on page {}", page),
        )
    }
}

/// Parse the `Pages:` line of pdfinfo output.
pub fn parse_pdfinfo_pages(stdout: &str) -> Option<u32> {
    stdout
        .lines()
        .find(|line| line.starts_with("Pages:"))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse().ok())
}

#[async_trait]
impl TextTier for AlternateTier {
    fn tier(&self) -> ExtractionTier {
        ExtractionTier::Alternate
    }

    async fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        let page_count = Self::page_count(path).await.unwrap_or(1);
        let mut text = String::new();
        let mut failures = 0;
        let mut last_error = None;

        for page in 1..=page_count {
            match Self::page_text(path, page).await {
                Ok(page_text) => {
                    text.push_str(&page_text);
                    text.push('\n');
                }
                Err(e @ ExtractionError::ToolNotFound(_)) => return Err(e),
                Err(e) => {
                    tracing::debug!("pdftotext page {} failed: {}", page, e);
                    failures += 1;
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if failures == page_count => Err(e),
            _ => Ok(text),
        }
    }
}

/// First-page rasterization with pdftoppm followed by Tesseract OCR.
#[derive(Debug, Clone)]
pub struct OcrTier {
    /// Tesseract language setting.
    pub lang: String,
    /// Rasterization resolution.
    pub dpi: u32,
}

impl Default for OcrTier {
    fn default() -> Self {
        Self {
            lang: "eng".to_string(),
            dpi: 300,
        }
    }
}

impl OcrTier {
    pub fn new(lang: &str, dpi: u32) -> Self {
        Self {
            lang: lang.to_string(),
            dpi,
        }
    }

    /// Render the first page to a PNG inside `dir`.
    async fn rasterize_first_page(&self, path: &Path, dir: &Path) -> Result<PathBuf, ExtractionError> {
        let prefix = dir.join("page");
        let output = Command::new("pdftoppm")
            .args(["-png", "-r", &self.dpi.to_string(), "-f", "1", "-l", "1"])
            .arg(path)
            .arg(&prefix)
            .kill_on_drop(true)
            .output()
            .await;
        handle_cmd_output(
            output,
            "pdftoppm (install poppler-utils)",
            "pdftoppm failed to render page",
        )?;

        // pdftoppm pads the page number depending on the page count
        let mut images: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "png"))
            .collect();
        images.sort();
        images.into_iter().next().ok_or_else(|| {
            ExtractionError::ExtractionFailed("No image generated from PDF".to_string())
        })
    }

    /// Run Tesseract OCR on an image.
    async fn run_tesseract(&self, image: &Path) -> Result<String, ExtractionError> {
        let output = Command::new("tesseract")
            .arg(image)
            .arg("stdout")
            .args(["-l", &self.lang])
            .kill_on_drop(true)
            .output()
            .await;
        handle_cmd_output(output, "tesseract (install tesseract-ocr)", "tesseract failed")
    }
}

#[async_trait]
impl TextTier for OcrTier {
    fn tier(&self) -> ExtractionTier {
        ExtractionTier::Ocr
    }

    async fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        let dir = TempDir::new()?;
        let image = self.rasterize_first_page(path, dir.path()).await?;
        let text = self.run_tesseract(&image).await;
        dir.close()?;
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pdfinfo_pages() {
        let stdout = "Title:          Annual Report\nProducer:       x\nPages:          42\nEncrypted:      no\n";
        assert_eq!(parse_pdfinfo_pages(stdout), Some(42));
        assert_eq!(parse_pdfinfo_pages("Title: nothing"), None);
    }

    #[test]
    fn test_missing_tool_maps_to_tool_not_found() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        assert!(matches!(
            handle_cmd_output(Err(err), "pdftotext", "failed"),
            Err(ExtractionError::ToolNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_structured_tier_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.pdf");
        std::fs::write(&path, b"%PDF-1.4 truncated").unwrap();
        assert!(StructuredTier.extract(&path).await.is_err());
    }

    #[test]
    fn test_tier_tags() {
        assert_eq!(StructuredTier.tier(), ExtractionTier::Structured);
        assert_eq!(AlternateTier.tier(), ExtractionTier::Alternate);
        assert_eq!(OcrTier::default().tier(), ExtractionTier::Ocr);
    }
}
