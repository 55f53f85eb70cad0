//! Shared helper functions for CLI commands.

use indicatif::ProgressStyle;

use crate::models::Company;
use crate::repository::DbContext;

/// Truncate a string for table display.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Look up a registered company by ticker.
pub async fn find_company(ctx: &DbContext, ticker: &str) -> anyhow::Result<Company> {
    ctx.companies()
        .get_by_ticker(ticker)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Unknown company '{}'", ticker))
}

/// Bar style for per-company progress.
pub fn company_progress_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}
