//! Report download service.
//!
//! Streams a PDF to disk under a temporary `.part` name and renames it into
//! place once complete, so a destination that exists is always a finished
//! download. Existing destinations are skipped.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::config::DownloadSettings;
use crate::scrapers::{FetchError, HttpClient};

/// Errors downloading a report.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("{url} is larger than the {cap} byte limit")]
    TooLarge { url: String, cap: u64 },

    #[error("{url} is not a PDF (detected {detected})")]
    NotPdf { url: String, detected: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_transient(),
            Self::Io(_) => true,
            Self::TooLarge { .. } | Self::NotPdf { .. } => false,
        }
    }
}

/// Result of a successful fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStatus {
    /// The file was downloaded, with its size in bytes.
    Downloaded(u64),
    /// The destination already existed and was left untouched.
    AlreadyPresent,
}

#[derive(Clone)]
pub struct Downloader {
    client: HttpClient,
    settings: DownloadSettings,
}

impl Downloader {
    pub fn new(client: HttpClient, settings: DownloadSettings) -> Self {
        Self { client, settings }
    }

    /// Download `url` to `destination`, retrying transient failures with a
    /// linearly increasing delay.
    pub async fn fetch(&self, url: &str, destination: &Path) -> Result<DownloadStatus, DownloadError> {
        if tokio::fs::try_exists(destination).await? {
            debug!(url, path = %destination.display(), "Already downloaded");
            return Ok(DownloadStatus::AlreadyPresent);
        }

        let max_attempts = self.settings.retries + 1;
        let mut attempt = 1;
        loop {
            match self.fetch_once(url, destination).await {
                Ok(size) => {
                    info!(url, path = %destination.display(), size, "Downloaded");
                    return Ok(DownloadStatus::Downloaded(size));
                }
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = self.settings.retry_delay(attempt);
                    warn!(
                        category = "fetch",
                        url,
                        attempt,
                        max_attempts,
                        "Download failed, retrying in {:?}: {}",
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(category = "fetch", url, attempt, "Download failed: {}", e);
                    return Err(e);
                }
            }
        }
    }

    async fn fetch_once(&self, url: &str, destination: &Path) -> Result<u64, DownloadError> {
        let cap = self.settings.max_bytes;
        let response = self.client.get(url).await?;
        if !response.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status.as_u16(),
            }
            .into());
        }
        if response.content_length().is_some_and(|len| len > cap) {
            return Err(DownloadError::TooLarge {
                url: url.to_string(),
                cap,
            });
        }

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let part = part_path(destination);
        let result = stream_to_file(response.into_response(), &part, url, cap).await;
        match result {
            Ok(size) => {
                tokio::fs::rename(&part, destination).await?;
                Ok(size)
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&part).await;
                Err(e)
            }
        }
    }
}

fn part_path(destination: &Path) -> PathBuf {
    let mut name = destination.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    destination.with_file_name(name)
}

/// Write the body to `path`, enforcing the size cap and checking the
/// leading bytes are a PDF.
async fn stream_to_file(
    mut response: reqwest::Response,
    path: &Path,
    url: &str,
    cap: u64,
) -> Result<u64, DownloadError> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut written: u64 = 0;
    let mut head: Vec<u8> = Vec::with_capacity(1024);

    while let Some(chunk) = response.chunk().await.map_err(FetchError::from)? {
        written += chunk.len() as u64;
        if written > cap {
            return Err(DownloadError::TooLarge {
                url: url.to_string(),
                cap,
            });
        }
        if head.len() < 1024 {
            let take = (1024 - head.len()).min(chunk.len());
            head.extend_from_slice(&chunk[..take]);
        }
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    match infer::get(&head) {
        Some(kind) if kind.mime_type() == "application/pdf" => Ok(written),
        Some(kind) => Err(DownloadError::NotPdf {
            url: url.to_string(),
            detected: kind.mime_type().to_string(),
        }),
        None => Err(DownloadError::NotPdf {
            url: url.to_string(),
            detected: "unknown".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_path() {
        assert_eq!(
            part_path(Path::new("/data/documents/ABC_report.pdf")),
            PathBuf::from("/data/documents/ABC_report.pdf.part")
        );
    }

    #[test]
    fn test_non_retryable_errors() {
        let too_large = DownloadError::TooLarge {
            url: "u".to_string(),
            cap: 1,
        };
        let not_pdf = DownloadError::NotPdf {
            url: "u".to_string(),
            detected: "text/html".to_string(),
        };
        assert!(!too_large.is_retryable());
        assert!(!not_pdf.is_retryable());
        assert!(DownloadError::Io(std::io::Error::other("disk")).is_retryable());
    }
}
