//! Company registry commands.

use console::style;

use super::helpers::{find_company, truncate};
use crate::config::Settings;
use crate::repository::CompanyInput;

/// Register or update a company.
pub async fn cmd_company_add(
    settings: &Settings,
    ticker: &str,
    website: Option<String>,
    market_cap: Option<f64>,
    currency: Option<String>,
    description: Option<String>,
) -> anyhow::Result<()> {
    if ticker.trim().is_empty() {
        anyhow::bail!("Ticker must not be empty");
    }

    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    let input = CompanyInput {
        ticker: ticker.to_string(),
        website,
        market_cap_value: market_cap,
        market_cap_currency: currency,
        description,
    };
    let company_id = ctx.companies().upsert(&input).await?;

    println!(
        "{} Saved {} (id {})",
        style("✓").green(),
        ticker.trim().to_uppercase(),
        company_id
    );
    Ok(())
}

/// List registered companies.
pub async fn cmd_company_list(settings: &Settings) -> anyhow::Result<()> {
    let ctx = settings.create_db_context();
    ctx.init_schema().await?;
    let companies = ctx.companies().get_all().await?;

    if companies.is_empty() {
        println!(
            "{} No companies registered. Run 'assay company add' first.",
            style("!").yellow()
        );
        return Ok(());
    }

    println!("\n{}", style("Companies").bold());
    println!("{}", "-".repeat(78));
    println!(
        "{:<5} {:<8} {:<6} {:<35} {}",
        "ID", "Ticker", "Size", "Website", "Market cap"
    );
    println!("{}", "-".repeat(78));

    for company in companies {
        let size = crate::models::SizeClass::from_market_cap(
            company.market_cap_value,
            settings.crawl.large_market_cap,
        );
        let market_cap = match (company.market_cap_value, &company.market_cap_currency) {
            (Some(value), Some(currency)) => format!("{:.0} {}", value, currency),
            (Some(value), None) => format!("{:.0}", value),
            _ => "-".to_string(),
        };
        println!(
            "{:<5} {:<8} {:<6} {:<35} {}",
            company.company_id,
            company.ticker,
            size.as_str(),
            truncate(company.website.as_deref().unwrap_or("-"), 34),
            market_cap
        );
    }

    Ok(())
}

/// Remove a company and its stored estimates.
pub async fn cmd_company_remove(settings: &Settings, ticker: &str) -> anyhow::Result<()> {
    let ctx = settings.create_db_context();
    ctx.init_schema().await?;
    let company = find_company(&ctx, ticker).await?;

    ctx.companies().delete(company.company_id).await?;
    println!("{} Removed {}", style("✓").green(), company.ticker);
    Ok(())
}
