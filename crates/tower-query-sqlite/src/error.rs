//! SQLite error type.

use thiserror::Error;

/// Errors from opening, querying or closing a SQLite connection.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// The database file could not be opened.
    #[error("cannot open database: {0}")]
    Open(#[source] rusqlite::Error),

    /// A statement failed to prepare or run.
    #[error("query failed: {0}")]
    Query(#[from] rusqlite::Error),

    /// The connection could not be closed cleanly.
    #[error("close failed: {0}")]
    Close(#[source] rusqlite::Error),

    /// The handle was used after its connection was closed.
    #[error("connection is closed")]
    Closed,

    /// The blocking task running the work panicked or was cancelled.
    #[error("blocking task failed: {0}")]
    Blocking(#[from] tokio::task::JoinError),
}

impl SqliteError {
    /// Returns `true` for SQLite's transient `SQLITE_BUSY` / `SQLITE_LOCKED`
    /// failures, the usual candidates for a retry predicate.
    pub fn is_busy(&self) -> bool {
        let err = match self {
            SqliteError::Open(err) | SqliteError::Query(err) | SqliteError::Close(err) => err,
            _ => return false,
        };

        matches!(
            err.sqlite_error_code(),
            Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
        )
    }
}
