//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM over SQLite through diesel-async's
//! `SyncConnectionWrapper`.

pub mod aggregates;
pub mod companies;
pub mod context;
pub mod errors;
pub mod models;
pub mod pool;

pub use aggregates::{AggregateExport, AggregateRepository};
pub use companies::{CompanyInput, CompanyRepository};
pub use context::DbContext;
pub use errors::ErrorLedgerRepository;
pub use pool::{DbError, SqliteConn, SqlitePool};

use chrono::{DateTime, Utc};

/// Parse a datetime string from the database, defaulting to Unix epoch on error.
pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}
