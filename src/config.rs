//! Configuration management for assayer using the prefer crate.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::{SizeClass, LARGE_MARKET_CAP};
use crate::repository::DbContext;

/// Default database filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "assayer.db";

/// Default documents subdirectory name.
const DOCUMENTS_SUBDIR: &str = "documents";

/// Crawl bounds and batching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlSettings {
    /// Maximum link depth for small companies (seed page is depth 0).
    pub small_max_depth: u32,
    /// Maximum link depth for large companies.
    pub large_max_depth: u32,
    /// Links followed per page for small companies.
    pub small_link_cap: usize,
    /// Links followed per page for large companies.
    pub large_link_cap: usize,
    /// Market cap at or above which a company is crawled as large.
    pub large_market_cap: f64,
    /// Companies crawled concurrently per batch.
    pub batch_size: usize,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            small_max_depth: 1,
            large_max_depth: 3,
            small_link_cap: 50,
            large_link_cap: 20,
            large_market_cap: LARGE_MARKET_CAP,
            batch_size: 5,
        }
    }
}

impl CrawlSettings {
    pub fn max_depth(&self, size: SizeClass) -> u32 {
        match size {
            SizeClass::Small => self.small_max_depth,
            SizeClass::Large => self.large_max_depth,
        }
    }

    pub fn link_cap(&self, size: SizeClass) -> usize {
        match size {
            SizeClass::Small => self.small_link_cap,
            SizeClass::Large => self.large_link_cap,
        }
    }
}

/// Document download limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    /// Refuse documents whose declared or streamed size exceeds this.
    pub max_bytes: u64,
    /// Attempts after the first failure.
    pub retries: u32,
    /// Base delay between attempts; attempt `n` waits `n * retry_delay_ms`.
    pub retry_delay_ms: u64,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            max_bytes: 250 * 1024 * 1024,
            retries: 3,
            retry_delay_ms: 2_000,
        }
    }
}

impl DownloadSettings {
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_delay_ms.saturating_mul(attempt as u64))
    }
}

/// Extraction cascade tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    /// Documents larger than this are split into page-range chunks.
    pub split_threshold_bytes: u64,
    /// Pages per chunk when splitting.
    pub chunk_pages: u32,
    /// Documents up to this size get the short per-tier timeout.
    pub small_document_bytes: u64,
    pub small_timeout_secs: u64,
    pub large_timeout_secs: u64,
    /// Whole-document retries after the cascade is exhausted.
    pub retries: u32,
    /// Base backoff between whole-document retries, doubled each time.
    pub retry_backoff_ms: u64,
    /// Tesseract language.
    pub tesseract_lang: String,
    /// Rasterization resolution for OCR.
    pub ocr_dpi: u32,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            split_threshold_bytes: 50 * 1024 * 1024,
            chunk_pages: 50,
            small_document_bytes: 10 * 1024 * 1024,
            small_timeout_secs: 60,
            large_timeout_secs: 600,
            retries: 2,
            retry_backoff_ms: 1_000,
            tesseract_lang: "eng".to_string(),
            ocr_dpi: 300,
        }
    }
}

impl ExtractionSettings {
    /// Per-tier timeout for a document of `size_bytes`.
    pub fn tier_timeout(&self, size_bytes: u64) -> Duration {
        if size_bytes <= self.small_document_bytes {
            Duration::from_secs(self.small_timeout_secs)
        } else {
            Duration::from_secs(self.large_timeout_secs)
        }
    }

    /// Backoff before whole-document retry number `retry` (1-based).
    pub fn retry_backoff(&self, retry: u32) -> Duration {
        let factor = 1u64 << retry.saturating_sub(1).min(16);
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(factor))
    }
}

/// Error ledger tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSettings {
    /// URLs that failed this many times are no longer retried.
    pub retry_cap: i32,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self { retry_cap: 3 }
    }
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename.
    pub database_filename: String,
    /// Directory downloaded documents are stored in.
    pub documents_dir: PathBuf,
    /// User agent for HTTP requests.
    pub user_agent: String,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// Delay between requests in milliseconds.
    pub request_delay_ms: u64,
    /// Additional log file sink.
    pub log_file: Option<PathBuf>,
    pub crawl: CrawlSettings,
    pub download: DownloadSettings,
    pub extraction: ExtractionSettings,
    pub ledger: LedgerSettings,
}

impl Default for Settings {
    fn default() -> Self {
        // ~/Documents/assayer, falling back to the home dir, then the current dir
        let data_dir = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("assayer");

        Self {
            documents_dir: data_dir.join(DOCUMENTS_SUBDIR),
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            user_agent: crate::scrapers::USER_AGENT.to_string(),
            request_timeout: 30,
            request_delay_ms: 500,
            log_file: None,
            crawl: CrawlSettings::default(),
            download: DownloadSettings::default(),
            extraction: ExtractionSettings::default(),
            ledger: LedgerSettings::default(),
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            documents_dir: data_dir.join(DOCUMENTS_SUBDIR),
            data_dir,
            ..Default::default()
        }
    }

    /// Get the full path to the database.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    /// Check if the database appears to be initialized.
    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }

    /// Ensure the data and documents directories exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        for (dir, label) in [(&self.data_dir, "data"), (&self.documents_dir, "documents")] {
            fs::create_dir_all(dir).map_err(|e| {
                std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create {} directory '{}': {}",
                        label,
                        dir.display(),
                        e
                    ),
                )
            })?;
        }
        Ok(())
    }

    /// Create a database context for the configured database.
    pub fn create_db_context(&self) -> DbContext {
        DbContext::new(&self.database_path())
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Database filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Directory for downloaded documents (defaults to `<data_dir>/documents`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents_dir: Option<String>,
    /// User agent string, or `"browser"` to present as a desktop browser.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    /// Delay between requests in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_delay_ms: Option<u64>,
    /// Additional log file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
    #[serde(default)]
    pub crawl: CrawlSettings,
    #[serde(default)]
    pub download: DownloadSettings,
    #[serde(default)]
    pub extraction: ExtractionSettings,
    #[serde(default)]
    pub ledger: LedgerSettings,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Discover and load the config file, falling back to defaults.
    pub async fn load() -> Self {
        // prefer finds the file; serde parses it
        match prefer::load("assayer").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => match Self::load_from_path(path).await {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!("{}", e);
                        Self::default()
                    }
                },
                None => Self::default(),
            },
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a file, choosing the parser by extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Directory containing the config file.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a possibly relative, possibly `~`-prefixed path against `base_dir`.
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration values over `settings`.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
            settings.documents_dir = settings.data_dir.join(DOCUMENTS_SUBDIR);
        }
        if let Some(ref documents_dir) = self.documents_dir {
            settings.documents_dir = self.resolve_path(documents_dir, base_dir);
        }
        if let Some(ref database) = self.database {
            settings.database_filename = database.clone();
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = user_agent.clone();
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(delay) = self.request_delay_ms {
            settings.request_delay_ms = delay;
        }
        if let Some(ref log_file) = self.log_file {
            settings.log_file = Some(self.resolve_path(log_file, base_dir));
        }
        settings.crawl = self.crawl.clone();
        settings.download = self.download.clone();
        settings.extraction = self.extraction.clone();
        settings.ledger = self.ledger.clone();
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (--config).
    pub config_path: Option<PathBuf>,
    /// Resolve relative paths against the current directory instead of the
    /// config file's directory.
    pub use_cwd: bool,
    /// Data directory override (--data).
    pub data: Option<PathBuf>,
}

/// Load settings from the config file and command line overrides.
pub async fn load_settings_with_options(options: LoadOptions) -> (Settings, Config) {
    let config = match options.config_path {
        Some(ref path) => match Config::load_from_path(path).await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{}, using defaults", e);
                Config::default()
            }
        },
        None => Config::load().await,
    };

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let base_dir = if options.use_cwd {
        cwd.clone()
    } else {
        config.base_dir().unwrap_or_else(|| cwd.clone())
    };

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir);

    if let Some(ref data) = options.data {
        let data_dir = if data.is_absolute() {
            data.clone()
        } else {
            cwd.join(data)
        };
        settings.documents_dir = data_dir.join(DOCUMENTS_SUBDIR);
        settings.data_dir = data_dir;
    }

    if let Some(ref path) = config.source_path {
        tracing::debug!("Loaded config from {}", path.display());
    }

    (settings, config)
}
