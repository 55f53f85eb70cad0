//! Batch orchestrator.
//!
//! Companies are processed in fixed-size batches. Within a batch each
//! company runs as its own task; the next batch starts only when every task
//! of the current one has finished. Cancellation is checked between batches.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::persistence::PersistenceCoordinator;
use crate::models::{Company, CrawlTarget, MinedFigures, ResourceAggregate};
use crate::repository::ErrorLedgerRepository;
use crate::scrapers::{CrawlReport, SiteCrawler};

/// Events emitted while a batch run progresses.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// A batch of companies is starting.
    BatchStarted { index: usize, size: usize },
    /// A company crawl started.
    CompanyStarted { ticker: String },
    /// A company finished (successfully or not).
    CompanyFinished {
        ticker: String,
        documents: usize,
        failures: usize,
    },
    /// A company has no website and was skipped.
    CompanySkipped { ticker: String },
}

/// Outcome of one company within a run.
#[derive(Debug, Clone)]
pub struct CompanyReport {
    pub company_id: i32,
    pub ticker: String,
    pub crawl: CrawlReport,
    /// Ledger entries re-attempted after the crawl.
    pub retried: usize,
    /// Aggregate after this run's figures were merged in.
    pub aggregate: Option<ResourceAggregate>,
    /// Ledger entries still unresolved at the end.
    pub unresolved: i64,
    /// Persistence failure, if the transaction rolled back.
    pub error: Option<String>,
}

/// Settings the orchestrator needs from the full configuration.
#[derive(Debug, Clone, Copy)]
pub struct BatchSettings {
    pub batch_size: usize,
    pub large_market_cap: f64,
    pub retry_cap: i32,
}

#[derive(Clone)]
pub struct BatchOrchestrator {
    crawler: Arc<SiteCrawler>,
    coordinator: PersistenceCoordinator,
    ledger: ErrorLedgerRepository,
    settings: BatchSettings,
}

impl BatchOrchestrator {
    pub fn new(
        crawler: Arc<SiteCrawler>,
        coordinator: PersistenceCoordinator,
        ledger: ErrorLedgerRepository,
        settings: BatchSettings,
    ) -> Self {
        Self {
            crawler,
            coordinator,
            ledger,
            settings,
        }
    }

    /// Process every company, batch by batch.
    ///
    /// Returns the reports of the companies that ran. Companies in batches
    /// not yet started when `cancel` fires are left out.
    pub async fn run(
        &self,
        companies: Vec<Company>,
        cancel: CancellationToken,
        event_tx: Option<mpsc::Sender<BatchEvent>>,
    ) -> Vec<CompanyReport> {
        let mut targets: Vec<CrawlTarget> = Vec::with_capacity(companies.len());
        for company in &companies {
            match company.to_target(self.settings.large_market_cap) {
                Some(target) => targets.push(target),
                None => {
                    warn!(ticker = %company.ticker, "No website, skipping");
                    send(&event_tx, BatchEvent::CompanySkipped {
                        ticker: company.ticker.clone(),
                    })
                    .await;
                }
            }
        }

        let batch_size = self.settings.batch_size.max(1);
        let total_batches = targets.len().div_ceil(batch_size);
        let mut reports = Vec::with_capacity(targets.len());

        for (index, batch) in targets.chunks(batch_size).enumerate() {
            if cancel.is_cancelled() {
                let remaining: usize = targets.len() - index * batch_size;
                warn!("Shutdown requested, {} companies not started", remaining);
                break;
            }

            info!(
                batch = index + 1,
                total = total_batches,
                size = batch.len(),
                "Starting batch"
            );
            send(&event_tx, BatchEvent::BatchStarted {
                index,
                size: batch.len(),
            })
            .await;

            let mut set = JoinSet::new();
            for target in batch.iter().cloned() {
                let this = self.clone();
                let event_tx = event_tx.clone();
                set.spawn(async move {
                    send(&event_tx, BatchEvent::CompanyStarted {
                        ticker: target.ticker.clone(),
                    })
                    .await;
                    let report = this.process_company(&target).await;
                    send(&event_tx, BatchEvent::CompanyFinished {
                        ticker: report.ticker.clone(),
                        documents: report.crawl.documents.len(),
                        failures: report.crawl.failures,
                    })
                    .await;
                    report
                });
            }

            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok(report) => reports.push(report),
                    Err(e) => error!("Company task failed: {}", e),
                }
            }
        }

        reports
    }

    /// Crawl one company, retry its open ledger entries once, then persist
    /// whatever figures were accepted.
    pub async fn process_company(&self, target: &CrawlTarget) -> CompanyReport {
        let mut crawl = self.crawler.crawl(target).await;

        let open = match self
            .ledger
            .list_unresolved(target.company_id, self.settings.retry_cap)
            .await
        {
            Ok(open) => open,
            Err(e) => {
                warn!(company_id = target.company_id, "Failed to read error ledger: {}", e);
                Vec::new()
            }
        };
        let retried = open.len();
        for entry in open {
            info!(company_id = target.company_id, url = %entry.url, retry_count = entry.retry_count, "Retrying");
            let retry = self.crawler.retry_url(target, &entry.url).await;
            crawl.absorb(retry);
        }

        let (aggregate, error) = if crawl.documents.is_empty() {
            (None, None)
        } else {
            let merged = crawl
                .documents
                .iter()
                .fold(MinedFigures::new(), |acc, doc| acc.merged_with(&doc.figures));
            match self.coordinator.upsert(target.company_id, &merged).await {
                Ok(aggregate) => (Some(aggregate), None),
                Err(e) => (None, Some(e.to_string())),
            }
        };

        let unresolved = self
            .ledger
            .count_unresolved(target.company_id)
            .await
            .unwrap_or_else(|e| {
                warn!(company_id = target.company_id, "Failed to count ledger entries: {}", e);
                0
            });

        CompanyReport {
            company_id: target.company_id,
            ticker: target.ticker.clone(),
            crawl,
            retried,
            aggregate,
            unresolved,
            error,
        }
    }
}

async fn send(event_tx: &Option<mpsc::Sender<BatchEvent>>, event: BatchEvent) {
    if let Some(tx) = event_tx {
        let _ = tx.send(event).await;
    }
}
