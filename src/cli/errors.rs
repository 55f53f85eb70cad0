//! Error ledger commands.

use std::collections::HashMap;

use console::style;

use super::helpers::{find_company, truncate};
use crate::config::Settings;

/// List ledger entries, optionally for one company.
pub async fn cmd_errors_list(
    settings: &Settings,
    ticker: Option<&str>,
    include_resolved: bool,
) -> anyhow::Result<()> {
    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    let company_id = match ticker {
        Some(t) => Some(find_company(&ctx, t).await?.company_id),
        None => None,
    };
    let tickers: HashMap<i32, String> = ctx
        .companies()
        .get_all()
        .await?
        .into_iter()
        .map(|c| (c.company_id, c.ticker))
        .collect();

    let entries = ctx.errors().list(company_id, include_resolved).await?;
    if entries.is_empty() {
        println!("{} No errors recorded", style("✓").green());
        return Ok(());
    }

    let retry_cap = settings.ledger.retry_cap;
    println!("\n{}", style("Error Ledger").bold());
    println!("{}", "-".repeat(100));
    println!(
        "{:<8} {:<45} {:>7} {:<9} {:<16} Message",
        "Ticker", "URL", "Retries", "State", "Last attempt"
    );
    println!("{}", "-".repeat(100));

    for entry in entries {
        let state = if entry.resolved {
            style("resolved").green()
        } else if entry.is_retryable(retry_cap) {
            style("open").yellow()
        } else {
            style("gave up").red()
        };
        let ticker = tickers
            .get(&entry.company_id)
            .cloned()
            .unwrap_or_else(|| entry.company_id.to_string());
        println!(
            "{:<8} {:<45} {:>7} {:<9} {:<16} {}",
            ticker,
            truncate(&entry.url, 44),
            entry.retry_count,
            state,
            entry.last_attempt.format("%Y-%m-%d %H:%M"),
            truncate(&entry.message, 60)
        );
    }

    Ok(())
}

/// Mark open ledger entries resolved.
pub async fn cmd_errors_resolve(settings: &Settings, ticker: Option<&str>) -> anyhow::Result<()> {
    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    let company_id = match ticker {
        Some(t) => Some(find_company(&ctx, t).await?.company_id),
        None => None,
    };
    let resolved = ctx.errors().resolve_all(company_id).await?;

    println!("{} Resolved {} entries", style("✓").green(), resolved);
    Ok(())
}
