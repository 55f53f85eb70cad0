//! Persistence coordinator for mined aggregates.
//!
//! All aggregate writes go through one coordinator whose lock is held for
//! the whole read-merge-write transaction, so concurrent company tasks never
//! interleave their updates.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::models::{MinedFigures, ResourceAggregate};
use crate::repository::{AggregateRepository, DbError};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to persist figures for company {company_id}: {source}")]
    Database {
        company_id: i32,
        #[source]
        source: DbError,
    },
}

/// Serializes aggregate upserts across tasks.
#[derive(Clone)]
pub struct PersistenceCoordinator {
    repo: AggregateRepository,
    write_lock: Arc<Mutex<()>>,
}

impl PersistenceCoordinator {
    pub fn new(repo: AggregateRepository) -> Self {
        Self {
            repo,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Merge validated figures into the company's stored aggregate.
    ///
    /// The transaction is rolled back on any error, leaving the previous
    /// aggregate (if any) untouched.
    pub async fn upsert(
        &self,
        company_id: i32,
        figures: &MinedFigures,
    ) -> Result<ResourceAggregate, PersistenceError> {
        let _guard = self.write_lock.lock().await;

        match self.repo.upsert(company_id, figures).await {
            Ok(aggregate) => {
                info!(
                    company_id,
                    reserve = ?aggregate.gold_equivalent.reserve,
                    measured_indicated = ?aggregate.gold_equivalent.measured_indicated,
                    resource = ?aggregate.gold_equivalent.resource,
                    production = ?aggregate.gold_equivalent.production,
                    "Stored gold-equivalent totals"
                );
                Ok(aggregate)
            }
            Err(source) => {
                error!(company_id, "Transaction rolled back: {}", source);
                Err(PersistenceError::Database { company_id, source })
            }
        }
    }
}
