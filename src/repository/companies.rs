//! Company registry repository.

use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};

use super::models::{CompanyRecord, NewCompany};
use super::pool::{DbError, SqlitePool};
use crate::models::Company;
use crate::schema::{companies, crawl_errors, mineral_estimates, production};

impl From<CompanyRecord> for Company {
    fn from(record: CompanyRecord) -> Self {
        Company {
            company_id: record.company_id,
            ticker: record.ticker,
            website: record.website,
            market_cap_value: record.market_cap_value,
            market_cap_currency: record.market_cap_currency,
            description: record.description,
        }
    }
}

/// Input for registering or updating a company.
#[derive(Debug, Clone, Default)]
pub struct CompanyInput {
    pub ticker: String,
    pub website: Option<String>,
    pub market_cap_value: Option<f64>,
    pub market_cap_currency: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct CompanyRepository {
    pool: SqlitePool,
}

impl CompanyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a company, or update the fields given for an existing ticker.
    /// Tickers are stored uppercase. Returns the company id.
    pub async fn upsert(&self, input: &CompanyInput) -> Result<i32, DbError> {
        let mut conn = self.pool.get().await?;

        let ticker = input.ticker.trim().to_uppercase();
        let new = NewCompany {
            ticker: &ticker,
            website: input.website.as_deref(),
            market_cap_value: input.market_cap_value,
            market_cap_currency: input.market_cap_currency.as_deref(),
            description: input.description.as_deref(),
        };

        diesel::insert_into(companies::table)
            .values(&new)
            .on_conflict(companies::ticker)
            .do_update()
            .set(&new)
            .execute(&mut conn)
            .await?;

        companies::table
            .filter(companies::ticker.eq(&ticker))
            .select(companies::company_id)
            .first(&mut conn)
            .await
    }

    /// Get a company by id.
    pub async fn get(&self, company_id: i32) -> Result<Option<Company>, DbError> {
        let mut conn = self.pool.get().await?;

        companies::table
            .find(company_id)
            .select(CompanyRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Company::from))
    }

    /// Get a company by ticker (case-insensitive).
    pub async fn get_by_ticker(&self, ticker: &str) -> Result<Option<Company>, DbError> {
        let mut conn = self.pool.get().await?;

        companies::table
            .filter(companies::ticker.eq(ticker.to_uppercase()))
            .select(CompanyRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Company::from))
    }

    /// Get all companies ordered by id.
    pub async fn get_all(&self) -> Result<Vec<Company>, DbError> {
        let mut conn = self.pool.get().await?;

        companies::table
            .order(companies::company_id.asc())
            .select(CompanyRecord::as_select())
            .load(&mut conn)
            .await
            .map(|records| records.into_iter().map(Company::from).collect())
    }

    /// Remove a company together with its mined rows and ledger entries.
    pub async fn delete(&self, company_id: i32) -> Result<bool, DbError> {
        let mut conn = self.pool.get().await?;

        conn.transaction(|conn| {
            Box::pin(async move {
                diesel::delete(mineral_estimates::table.find(company_id))
                    .execute(conn)
                    .await?;
                diesel::delete(production::table.find(company_id))
                    .execute(conn)
                    .await?;
                diesel::delete(crawl_errors::table.filter(crawl_errors::company_id.eq(company_id)))
                    .execute(conn)
                    .await?;
                let rows = diesel::delete(companies::table.find(company_id))
                    .execute(conn)
                    .await?;
                Ok(rows > 0)
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Metal, MinedFigures, QuantityType};
    use crate::repository::DbContext;
    use tempfile::tempdir;

    async fn setup() -> (tempfile::TempDir, DbContext) {
        let dir = tempdir().unwrap();
        let ctx = DbContext::new(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        (dir, ctx)
    }

    #[tokio::test]
    async fn test_upsert_normalizes_ticker() {
        let (_dir, ctx) = setup().await;
        let repo = ctx.companies();

        let id = repo
            .upsert(&CompanyInput {
                ticker: " abc ".to_string(),
                website: Some("abc-mining.example".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        let again = repo
            .upsert(&CompanyInput {
                ticker: "ABC".to_string(),
                website: Some("https://abc-mining.example".to_string()),
                market_cap_value: Some(750_000_000.0),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(id, again);
        let company = repo.get_by_ticker("abc").await.unwrap().unwrap();
        assert_eq!(company.ticker, "ABC");
        assert_eq!(company.website.as_deref(), Some("https://abc-mining.example"));
        assert_eq!(repo.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_dependent_rows() {
        let (_dir, ctx) = setup().await;
        let id = ctx
            .companies()
            .upsert(&CompanyInput {
                ticker: "XYZ".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let mut figures = MinedFigures::new();
        figures.set(Metal::Gold, QuantityType::Reserve, Some(1.5));
        ctx.aggregates().upsert(id, &figures).await.unwrap();
        ctx.errors()
            .record(id, "https://xyz.example/r.pdf", "timeout")
            .await
            .unwrap();

        assert!(ctx.companies().delete(id).await.unwrap());
        assert!(ctx.companies().get(id).await.unwrap().is_none());
        assert!(ctx.aggregates().get(id).await.unwrap().is_none());
        assert_eq!(ctx.errors().count_unresolved(id).await.unwrap(), 0);
        assert!(!ctx.companies().delete(id).await.unwrap());
    }
}
