//! Single-document mining command.

use std::path::Path;

use console::style;

use crate::config::Settings;
use crate::extraction::ExtractionCascade;
use crate::models::{Metal, QuantityType};
use crate::services::{ProcessOutcome, ReportProcessor};
use crate::utils::{format_figure, format_size};

/// Run extraction, mining and validation on a local PDF and print the result.
pub async fn cmd_mine(settings: &Settings, file: &Path, description: &str) -> anyhow::Result<()> {
    let size = tokio::fs::metadata(file)
        .await
        .map_err(|e| anyhow::anyhow!("Cannot read {}: {}", file.display(), e))?
        .len();

    println!(
        "{} Mining {} ({})",
        style("→").cyan(),
        file.display(),
        format_size(size)
    );

    let cascade = ExtractionCascade::new(settings.extraction.clone());
    let analysis = ReportProcessor::analyze_file(&cascade, file, description).await?;

    println!(
        "  Extracted {} characters via {} tier",
        analysis.text_chars,
        analysis.tier.as_str()
    );

    println!("\n{}", style("Mined Figures").bold());
    println!("{}", "-".repeat(60));
    println!(
        "{:<20} {:<12} {:<12} {:<12}",
        "Quantity", "Gold", "Silver", "AuEq"
    );
    println!("{}", "-".repeat(60));
    for quantity in QuantityType::ALL {
        let unit = quantity.unit().as_str();
        println!(
            "{:<20} {:<12} {:<12} {:<12}",
            quantity.as_str(),
            format_figure(analysis.figures.get(Metal::Gold, quantity), unit),
            format_figure(analysis.figures.get(Metal::Silver, quantity), unit),
            format_figure(analysis.gold_equivalent.get(quantity), unit),
        );
    }
    println!();

    match analysis.outcome {
        ProcessOutcome::Accepted(_) => {
            println!("{} Figures pass validation", style("✓").green());
        }
        ProcessOutcome::Rejected(e) => {
            println!("{} Rejected: {}", style("✗").red(), e);
        }
        ProcessOutcome::NoFigures => {
            println!("{} No figures found", style("!").yellow());
        }
    }

    Ok(())
}
