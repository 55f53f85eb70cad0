//! SQLite connections for the repositories.
//!
//! A connection is opened per operation. SQLite does its own file locking
//! and the persistence coordinator serializes writers above this layer.

use std::path::{Path, PathBuf};

use diesel::result::DatabaseErrorKind;
use diesel::sqlite::SqliteConnection;
use diesel_async::sync_connection_wrapper::SyncConnectionWrapper;
use diesel_async::{AsyncConnection, SimpleAsyncConnection};

/// Diesel error type alias.
pub type DbError = diesel::result::Error;

/// Async SQLite connection type.
pub type SqliteConn = SyncConnectionWrapper<SqliteConnection>;

/// How long a connection waits on another writer before giving up.
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Opens connections to one database file.
#[derive(Clone, Debug)]
pub struct SqlitePool {
    path: PathBuf,
}

impl SqlitePool {
    pub fn from_path(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub async fn get(&self) -> Result<SqliteConn, DbError> {
        let url = self.path.display().to_string();
        let mut conn = SqliteConn::establish(&url)
            .await
            .map_err(|e| connection_error(&url, e))?;
        conn.batch_execute(&format!("PRAGMA busy_timeout = {};", BUSY_TIMEOUT_MS))
            .await?;
        Ok(conn)
    }
}

/// Repositories only speak `DbError`, so connection failures are folded into it.
fn connection_error(url: &str, e: diesel::ConnectionError) -> DbError {
    DbError::DatabaseError(
        DatabaseErrorKind::Unknown,
        Box::new(format!("{}: {}", url, e)),
    )
}
