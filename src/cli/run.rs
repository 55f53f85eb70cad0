//! Batch run command.

use std::sync::Arc;

use console::style;
use indicatif::ProgressBar;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::helpers::{company_progress_style, find_company};
use crate::config::Settings;
use crate::extraction::ExtractionCascade;
use crate::scrapers::{HttpClient, SiteCrawler};
use crate::services::{
    BatchEvent, BatchOrchestrator, BatchSettings, CompanyReport, Downloader,
    PersistenceCoordinator, ReportProcessor,
};
use crate::utils::format_figure;

/// Crawl and mine the selected companies (all when `tickers` is empty).
pub async fn cmd_run(
    settings: &Settings,
    tickers: &[String],
    batch_size: Option<usize>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    settings.ensure_directories()?;
    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    let companies = if tickers.is_empty() {
        ctx.companies().get_all().await?
    } else {
        let mut selected = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            selected.push(find_company(&ctx, ticker).await?);
        }
        selected
    };

    if companies.is_empty() {
        println!(
            "{} No companies registered. Run 'assay company add' first.",
            style("!").yellow()
        );
        return Ok(());
    }

    let client = HttpClient::from_settings(settings)?;
    let downloader = Downloader::new(client.clone(), settings.download.clone());
    let cascade = ExtractionCascade::new(settings.extraction.clone());
    let processor = ReportProcessor::new(downloader, cascade, settings.documents_dir.clone());
    let crawler = SiteCrawler::new(
        Arc::new(client),
        Arc::new(processor),
        settings.crawl.clone(),
    )
    .with_ledger(ctx.errors());

    let orchestrator = BatchOrchestrator::new(
        Arc::new(crawler),
        PersistenceCoordinator::new(ctx.aggregates()),
        ctx.errors(),
        BatchSettings {
            batch_size: batch_size.unwrap_or(settings.crawl.batch_size),
            large_market_cap: settings.crawl.large_market_cap,
            retry_cap: settings.ledger.retry_cap,
        },
    );

    println!(
        "{} Processing {} companies",
        style("→").cyan(),
        companies.len()
    );

    let pb = ProgressBar::new(companies.len() as u64);
    pb.set_style(company_progress_style());

    let (event_tx, mut event_rx) = mpsc::channel::<BatchEvent>(100);
    let pb_events = pb.clone();
    let event_handler = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                BatchEvent::BatchStarted { index, size } => {
                    pb_events.set_message(format!("batch {} ({} companies)", index + 1, size));
                }
                BatchEvent::CompanyStarted { ticker } => {
                    pb_events.set_message(ticker);
                }
                BatchEvent::CompanyFinished {
                    ticker,
                    documents,
                    failures,
                } => {
                    pb_events.inc(1);
                    if failures > 0 {
                        pb_events.println(format!(
                            "  {} {}: {} document(s), {} failure(s)",
                            style("!").yellow(),
                            ticker,
                            documents,
                            failures
                        ));
                    }
                }
                BatchEvent::CompanySkipped { ticker } => {
                    pb_events.inc(1);
                    pb_events.println(format!(
                        "  {} {}: no website",
                        style("○").dim(),
                        ticker
                    ));
                }
            }
        }
    });

    let mut reports = orchestrator
        .run(companies, cancel.clone(), Some(event_tx))
        .await;
    let _ = event_handler.await;
    pb.finish_and_clear();

    reports.sort_by(|a, b| a.ticker.cmp(&b.ticker));
    print_summary(&reports);

    if cancel.is_cancelled() {
        println!(
            "{} Interrupted, remaining companies were not started",
            style("!").yellow()
        );
    }

    Ok(())
}

fn print_summary(reports: &[CompanyReport]) {
    println!("\n{}", style("Run Summary").bold());
    println!("{}", "-".repeat(100));
    println!(
        "{:<8} {:>5} {:>5} {:>5} {:>5} {:>5}  {:<12} {:<12} {:<12} {:<12}",
        "Ticker", "Pages", "Docs", "Rej", "Fail", "Open", "AuEq Res", "AuEq M&I", "AuEq Rsrc", "AuEq Prod"
    );
    println!("{}", "-".repeat(100));

    let mut with_errors = Vec::new();
    for report in reports {
        let aueq = report.aggregate.as_ref().map(|a| a.gold_equivalent);
        println!(
            "{:<8} {:>5} {:>5} {:>5} {:>5} {:>5}  {:<12} {:<12} {:<12} {:<12}",
            report.ticker,
            report.crawl.pages_visited,
            report.crawl.documents.len(),
            report.crawl.rejected,
            report.crawl.failures,
            report.unresolved,
            format_figure(aueq.and_then(|g| g.reserve), "Moz"),
            format_figure(aueq.and_then(|g| g.measured_indicated), "Moz"),
            format_figure(aueq.and_then(|g| g.resource), "Moz"),
            format_figure(aueq.and_then(|g| g.production), "koz"),
        );
        if report.unresolved > 0 || report.error.is_some() {
            with_errors.push(report);
        }
    }

    if with_errors.is_empty() {
        println!("\n{} All companies completed cleanly", style("✓").green());
        return;
    }

    println!();
    for report in with_errors {
        if let Some(ref error) = report.error {
            println!("{} {}: {}", style("✗").red(), report.ticker, error);
        }
        if report.unresolved > 0 {
            println!(
                "{} {}: {} unresolved error(s), see 'assay errors list {}'",
                style("!").yellow(),
                report.ticker,
                report.unresolved,
                report.ticker
            );
        }
    }
}
