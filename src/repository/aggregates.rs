//! Resource aggregate repository.
//!
//! A company's aggregate is stored across two tables: in-ground estimates in
//! `mineral_estimates` (Moz) and current output in `production` (koz). Both
//! rows are written together inside one transaction.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};

use super::models::{
    MineralEstimateRecord, NewMineralEstimate, NewProduction, ProductionRecord,
};
use super::parse_datetime;
use super::pool::{DbError, SqliteConn, SqlitePool};
use crate::mining::gold_equivalent;
use crate::models::{
    GoldEquivalent, Metal, MinedFigures, QuantityType::*, ResourceAggregate,
};
use crate::schema::{companies, mineral_estimates, production};

/// Rebuild an aggregate from its stored rows.
fn aggregate_from_records(
    company_id: i32,
    estimate: Option<MineralEstimateRecord>,
    output: Option<ProductionRecord>,
) -> Option<ResourceAggregate> {
    if estimate.is_none() && output.is_none() {
        return None;
    }

    let mut figures = MinedFigures::new();
    let mut aueq = GoldEquivalent::default();
    let mut last_updated = None;

    if let Some(e) = estimate {
        figures.set(Metal::Gold, Reserve, e.gold_reserve_moz);
        figures.set(Metal::Gold, MeasuredIndicated, e.gold_mi_moz);
        figures.set(Metal::Gold, Resource, e.gold_resource_moz);
        figures.set(Metal::Silver, Reserve, e.silver_reserve_moz);
        figures.set(Metal::Silver, MeasuredIndicated, e.silver_mi_moz);
        figures.set(Metal::Silver, Resource, e.silver_resource_moz);
        aueq.reserve = e.aueq_reserve_moz;
        aueq.measured_indicated = e.aueq_mi_moz;
        aueq.resource = e.aueq_resource_moz;
        last_updated = Some(parse_datetime(&e.last_updated));
    }
    if let Some(p) = output {
        figures.set(Metal::Gold, Production, p.gold_koz);
        figures.set(Metal::Silver, Production, p.silver_koz);
        aueq.production = p.aueq_koz;
        let ts = parse_datetime(&p.last_updated);
        last_updated = Some(last_updated.map_or(ts, |prev: chrono::DateTime<Utc>| prev.max(ts)));
    }

    Some(ResourceAggregate {
        company_id,
        figures,
        gold_equivalent: aueq,
        last_updated: last_updated.unwrap_or(chrono::DateTime::UNIX_EPOCH),
    })
}

async fn load_with(conn: &mut SqliteConn, company_id: i32) -> Result<Option<ResourceAggregate>, DbError> {
    let estimate = mineral_estimates::table
        .find(company_id)
        .select(MineralEstimateRecord::as_select())
        .first(conn)
        .await
        .optional()?;
    let output = production::table
        .find(company_id)
        .select(ProductionRecord::as_select())
        .first(conn)
        .await
        .optional()?;

    Ok(aggregate_from_records(company_id, estimate, output))
}

/// A stored aggregate joined with its company's ticker, for export.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AggregateExport {
    pub ticker: String,
    #[serde(flatten)]
    pub aggregate: ResourceAggregate,
}

#[derive(Clone)]
pub struct AggregateRepository {
    pool: SqlitePool,
}

impl AggregateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the stored aggregate for a company.
    pub async fn get(&self, company_id: i32) -> Result<Option<ResourceAggregate>, DbError> {
        let mut conn = self.pool.get().await?;
        load_with(&mut conn, company_id).await
    }

    /// Merge validated figures into the company's aggregate and recompute
    /// its gold-equivalent totals.
    ///
    /// Reads the existing rows, overlays every non-null new figure, and
    /// writes both tables in a single transaction. On error the transaction
    /// is rolled back and nothing is visible.
    pub async fn upsert(
        &self,
        company_id: i32,
        figures: &MinedFigures,
    ) -> Result<ResourceAggregate, DbError> {
        let mut conn = self.pool.get().await?;
        let figures = *figures;

        conn.transaction(|conn| {
            Box::pin(async move {
                let existing = load_with(conn, company_id).await?;
                let merged = match &existing {
                    Some(stored) => stored.figures.merged_with(&figures),
                    None => figures,
                };
                let aueq = gold_equivalent(&merged);
                let now = Utc::now();
                let now_str = now.to_rfc3339();

                diesel::replace_into(mineral_estimates::table)
                    .values(&NewMineralEstimate {
                        company_id,
                        gold_reserve_moz: merged.get(Metal::Gold, Reserve),
                        gold_mi_moz: merged.get(Metal::Gold, MeasuredIndicated),
                        gold_resource_moz: merged.get(Metal::Gold, Resource),
                        silver_reserve_moz: merged.get(Metal::Silver, Reserve),
                        silver_mi_moz: merged.get(Metal::Silver, MeasuredIndicated),
                        silver_resource_moz: merged.get(Metal::Silver, Resource),
                        aueq_reserve_moz: aueq.reserve,
                        aueq_mi_moz: aueq.measured_indicated,
                        aueq_resource_moz: aueq.resource,
                        last_updated: &now_str,
                    })
                    .execute(conn)
                    .await?;

                diesel::replace_into(production::table)
                    .values(&NewProduction {
                        company_id,
                        gold_koz: merged.get(Metal::Gold, Production),
                        silver_koz: merged.get(Metal::Silver, Production),
                        aueq_koz: aueq.production,
                        last_updated: &now_str,
                    })
                    .execute(conn)
                    .await?;

                Ok(ResourceAggregate {
                    company_id,
                    figures: merged,
                    gold_equivalent: aueq,
                    last_updated: now,
                })
            })
        })
        .await
    }

    /// All stored aggregates with their tickers, ordered by ticker.
    pub async fn get_all_for_export(&self) -> Result<Vec<AggregateExport>, DbError> {
        let mut conn = self.pool.get().await?;

        let estimates: Vec<(String, MineralEstimateRecord)> = mineral_estimates::table
            .inner_join(companies::table)
            .select((companies::ticker, MineralEstimateRecord::as_select()))
            .order(companies::ticker.asc())
            .load(&mut conn)
            .await?;
        let mut outputs: Vec<(String, ProductionRecord)> = production::table
            .inner_join(companies::table)
            .select((companies::ticker, ProductionRecord::as_select()))
            .load(&mut conn)
            .await?;

        let mut exports = Vec::with_capacity(estimates.len());
        for (ticker, estimate) in estimates {
            let company_id = estimate.company_id;
            let output = outputs
                .iter()
                .position(|(_, p)| p.company_id == company_id)
                .map(|i| outputs.swap_remove(i).1);
            if let Some(aggregate) = aggregate_from_records(company_id, Some(estimate), output) {
                exports.push(AggregateExport { ticker, aggregate });
            }
        }
        // Production rows without an estimate row
        for (ticker, output) in outputs {
            if let Some(aggregate) = aggregate_from_records(output.company_id, None, Some(output)) {
                exports.push(AggregateExport { ticker, aggregate });
            }
        }
        exports.sort_by(|a, b| a.ticker.cmp(&b.ticker));

        Ok(exports)
    }
}
