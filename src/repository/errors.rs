//! Error ledger repository.
//!
//! One row per (company_id, url). Recording a failure for a URL that already
//! has a row bumps its retry count instead of adding a duplicate.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::CrawlErrorRecord;
use super::parse_datetime;
use super::pool::{DbError, SqlitePool};
use crate::models::ErrorRecord;
use crate::schema::crawl_errors;

impl From<CrawlErrorRecord> for ErrorRecord {
    fn from(record: CrawlErrorRecord) -> Self {
        ErrorRecord {
            company_id: record.company_id,
            url: record.url,
            message: record.message,
            retry_count: record.retry_count,
            resolved: record.resolved,
            last_attempt: parse_datetime(&record.last_attempt),
            created_at: parse_datetime(&record.created_at),
        }
    }
}

#[derive(Clone)]
pub struct ErrorLedgerRepository {
    pool: SqlitePool,
}

impl ErrorLedgerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a failure. A repeated failure increments `retry_count`, replaces
    /// the message and timestamp, and reopens a resolved entry.
    pub async fn record(
        &self,
        company_id: i32,
        url: &str,
        message: &str,
    ) -> Result<ErrorRecord, DbError> {
        let mut conn = self.pool.get().await?;
        let now = Utc::now().to_rfc3339();

        diesel::insert_into(crawl_errors::table)
            .values((
                crawl_errors::company_id.eq(company_id),
                crawl_errors::url.eq(url),
                crawl_errors::message.eq(message),
                crawl_errors::retry_count.eq(0),
                crawl_errors::resolved.eq(false),
                crawl_errors::last_attempt.eq(&now),
                crawl_errors::created_at.eq(&now),
            ))
            .on_conflict((crawl_errors::company_id, crawl_errors::url))
            .do_update()
            .set((
                crawl_errors::retry_count.eq(crawl_errors::retry_count + 1),
                crawl_errors::message.eq(message),
                crawl_errors::resolved.eq(false),
                crawl_errors::last_attempt.eq(&now),
            ))
            .execute(&mut conn)
            .await?;

        crawl_errors::table
            .filter(crawl_errors::company_id.eq(company_id))
            .filter(crawl_errors::url.eq(url))
            .select(CrawlErrorRecord::as_select())
            .first(&mut conn)
            .await
            .map(ErrorRecord::from)
    }

    /// Unresolved entries for a company whose retry count is below `retry_cap`.
    pub async fn list_unresolved(
        &self,
        company_id: i32,
        retry_cap: i32,
    ) -> Result<Vec<ErrorRecord>, DbError> {
        let mut conn = self.pool.get().await?;

        crawl_errors::table
            .filter(crawl_errors::company_id.eq(company_id))
            .filter(crawl_errors::resolved.eq(false))
            .filter(crawl_errors::retry_count.lt(retry_cap))
            .order(crawl_errors::created_at.asc())
            .select(CrawlErrorRecord::as_select())
            .load(&mut conn)
            .await
            .map(|records| records.into_iter().map(ErrorRecord::from).collect())
    }

    /// All entries, optionally for one company, newest attempt first.
    pub async fn list(
        &self,
        company_id: Option<i32>,
        include_resolved: bool,
    ) -> Result<Vec<ErrorRecord>, DbError> {
        let mut conn = self.pool.get().await?;

        let mut query = crawl_errors::table
            .select(CrawlErrorRecord::as_select())
            .order(crawl_errors::last_attempt.desc())
            .into_boxed();
        if let Some(id) = company_id {
            query = query.filter(crawl_errors::company_id.eq(id));
        }
        if !include_resolved {
            query = query.filter(crawl_errors::resolved.eq(false));
        }

        query
            .load(&mut conn)
            .await
            .map(|records| records.into_iter().map(ErrorRecord::from).collect())
    }

    /// Mark one URL's entry as resolved.
    pub async fn mark_resolved(&self, company_id: i32, url: &str) -> Result<bool, DbError> {
        let mut conn = self.pool.get().await?;

        let rows = diesel::update(
            crawl_errors::table
                .filter(crawl_errors::company_id.eq(company_id))
                .filter(crawl_errors::url.eq(url)),
        )
        .set(crawl_errors::resolved.eq(true))
        .execute(&mut conn)
        .await?;

        Ok(rows > 0)
    }

    /// Mark every unresolved entry resolved, optionally for one company.
    pub async fn resolve_all(&self, company_id: Option<i32>) -> Result<usize, DbError> {
        let mut conn = self.pool.get().await?;

        match company_id {
            Some(id) => {
                diesel::update(
                    crawl_errors::table
                        .filter(crawl_errors::company_id.eq(id))
                        .filter(crawl_errors::resolved.eq(false)),
                )
                .set(crawl_errors::resolved.eq(true))
                .execute(&mut conn)
                .await
            }
            None => {
                diesel::update(crawl_errors::table.filter(crawl_errors::resolved.eq(false)))
                    .set(crawl_errors::resolved.eq(true))
                    .execute(&mut conn)
                    .await
            }
        }
    }

    /// Number of unresolved entries for a company.
    pub async fn count_unresolved(&self, company_id: i32) -> Result<i64, DbError> {
        let mut conn = self.pool.get().await?;

        use diesel::dsl::count_star;
        crawl_errors::table
            .filter(crawl_errors::company_id.eq(company_id))
            .filter(crawl_errors::resolved.eq(false))
            .select(count_star())
            .first(&mut conn)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::DbContext;
    use tempfile::tempdir;

    async fn setup_test_db() -> (ErrorLedgerRepository, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let ctx = DbContext::new(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        (ctx.errors(), dir)
    }

    #[tokio::test]
    async fn test_repeated_failure_increments_retry_count() {
        let (ledger, _dir) = setup_test_db().await;

        let first = ledger.record(1, "https://a.example/r.pdf", "timeout").await.unwrap();
        assert_eq!(first.retry_count, 0);
        let second = ledger.record(1, "https://a.example/r.pdf", "HTTP 503").await.unwrap();
        assert_eq!(second.retry_count, 1);
        assert_eq!(second.message, "HTTP 503");
        assert_eq!(second.created_at, first.created_at);

        let all = ledger.list(Some(1), true).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_list_unresolved_respects_cap_and_company() {
        let (ledger, _dir) = setup_test_db().await;

        ledger.record(1, "https://a.example/one.pdf", "x").await.unwrap();
        for _ in 0..4 {
            ledger.record(1, "https://a.example/two.pdf", "x").await.unwrap();
        }
        ledger.record(2, "https://b.example/one.pdf", "x").await.unwrap();

        let open = ledger.list_unresolved(1, 3).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].url, "https://a.example/one.pdf");
        assert_eq!(ledger.count_unresolved(1).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_mark_resolved_and_reopen() {
        let (ledger, _dir) = setup_test_db().await;
        let url = "https://a.example/r.pdf";

        ledger.record(1, url, "x").await.unwrap();
        assert!(ledger.mark_resolved(1, url).await.unwrap());
        assert!(ledger.list_unresolved(1, 3).await.unwrap().is_empty());
        assert!(!ledger.mark_resolved(1, "https://a.example/missing.pdf").await.unwrap());

        let reopened = ledger.record(1, url, "again").await.unwrap();
        assert!(!reopened.resolved);
        assert_eq!(ledger.resolve_all(None).await.unwrap(), 1);
    }
}
