//! Database context for managing the connection pool and repository access.

use std::path::Path;

use diesel_async::SimpleAsyncConnection;

use super::aggregates::AggregateRepository;
use super::companies::CompanyRepository;
use super::errors::ErrorLedgerRepository;
use super::pool::{DbError, SqlitePool};

/// Database context that owns the pool and hands out repositories.
///
/// Create one context per command, then use it to access all repositories.
///
/// # Example
/// ```ignore
/// let ctx = DbContext::new(&db_path);
/// ctx.init_schema().await?;
/// let companies = ctx.companies().get_all().await?;
/// ```
#[derive(Clone, Debug)]
pub struct DbContext {
    pool: SqlitePool,
}

impl DbContext {
    /// Create a new database context from a file path.
    pub fn new(db_path: &Path) -> Self {
        Self {
            pool: SqlitePool::from_path(db_path),
        }
    }

    /// Create a context with an existing pool.
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn companies(&self) -> CompanyRepository {
        CompanyRepository::new(self.pool.clone())
    }

    pub fn aggregates(&self) -> AggregateRepository {
        AggregateRepository::new(self.pool.clone())
    }

    pub fn errors(&self) -> ErrorLedgerRepository {
        ErrorLedgerRepository::new(self.pool.clone())
    }

    /// Create all tables if they don't exist.
    pub async fn init_schema(&self) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;
        conn.batch_execute(
            r#"
            PRAGMA journal_mode = WAL;

            -- Companies to crawl
            CREATE TABLE IF NOT EXISTS companies (
                company_id INTEGER PRIMARY KEY AUTOINCREMENT,
                ticker TEXT NOT NULL UNIQUE,
                website TEXT,
                market_cap_value REAL,
                market_cap_currency TEXT,
                description TEXT
            );

            -- In-ground estimates, Moz
            CREATE TABLE IF NOT EXISTS mineral_estimates (
                company_id INTEGER PRIMARY KEY,
                gold_reserve_moz REAL,
                gold_mi_moz REAL,
                gold_resource_moz REAL,
                silver_reserve_moz REAL,
                silver_mi_moz REAL,
                silver_resource_moz REAL,
                aueq_reserve_moz REAL,
                aueq_mi_moz REAL,
                aueq_resource_moz REAL,
                last_updated TEXT NOT NULL
            );

            -- Current production, koz
            CREATE TABLE IF NOT EXISTS production (
                company_id INTEGER PRIMARY KEY,
                gold_koz REAL,
                silver_koz REAL,
                aueq_koz REAL,
                last_updated TEXT NOT NULL
            );

            -- Error ledger
            CREATE TABLE IF NOT EXISTS crawl_errors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                company_id INTEGER NOT NULL,
                url TEXT NOT NULL,
                message TEXT NOT NULL,
                retry_count INTEGER NOT NULL DEFAULT 0,
                resolved INTEGER NOT NULL DEFAULT 0,
                last_attempt TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE(company_id, url)
            );

            CREATE INDEX IF NOT EXISTS idx_crawl_errors_open
                ON crawl_errors(company_id, resolved);
            "#,
        )
        .await
    }
}
