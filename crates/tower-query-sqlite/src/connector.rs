use crate::error::SqliteError;
use crate::Rows;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use rusqlite::types::Value;
use rusqlite::{Connection, InterruptHandle};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tower_query_scope::ResourceManager;
use tracing::{trace, warn};

/// Opens a fresh SQLite connection for every scope and closes it on release.
///
/// The file is created if it does not exist. Connections are not pooled.
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    path: PathBuf,
}

impl SqliteConnector {
    /// Creates a connector for the database file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the database path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResourceManager for SqliteConnector {
    type Handle = SqliteHandle;
    type Error = SqliteError;

    fn acquire(&self) -> BoxFuture<'_, Result<SqliteHandle, SqliteError>> {
        let path = self.path.clone();
        Box::pin(async move {
            let conn = tokio::task::spawn_blocking(move || Connection::open(path))
                .await?
                .map_err(SqliteError::Open)?;
            trace!(path = %self.path.display(), "sqlite connection opened");
            Ok(SqliteHandle::new(conn))
        })
    }

    fn release(&self, handle: &SqliteHandle) -> Result<(), SqliteError> {
        handle.close()
    }
}

/// An open SQLite connection owned by one scope.
///
/// Statements run synchronously on the calling thread; async callers move
/// the handle to the blocking pool (see [`FetchAll`](crate::FetchAll)).
///
/// [`close`](Self::close) never waits for a running statement. It
/// interrupts the statement and, if the connection is still in use, leaves
/// the close to the thread running it.
pub struct SqliteHandle {
    conn: Mutex<Option<Connection>>,
    interrupt: InterruptHandle,
    closing: AtomicBool,
}

impl SqliteHandle {
    /// Wraps an open connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            interrupt: conn.get_interrupt_handle(),
            conn: Mutex::new(Some(conn)),
            closing: AtomicBool::new(false),
        }
    }

    /// Runs `sql` verbatim and returns every row, each as its column values.
    pub fn fetch_all(&self, sql: &str) -> Result<Vec<Vec<Value>>, SqliteError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let columns = stmt.column_count();
            let rows = stmt
                .query_map([], |row| {
                    (0..columns)
                        .map(|i| row.get::<_, Value>(i))
                        .collect::<Result<Vec<_>, _>>()
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Like [`fetch_all`](Self::fetch_all), with the rows behind an `Arc`.
    pub fn fetch_shared(&self, sql: &str) -> Result<Rows, SqliteError> {
        self.fetch_all(sql).map(Rows::new)
    }

    /// Runs one or more statements that return no rows.
    pub fn execute_batch(&self, sql: &str) -> Result<(), SqliteError> {
        self.with_conn(|conn| Ok(conn.execute_batch(sql)?))
    }

    /// Returns `true` once the connection has been closed or a close is
    /// pending on a running statement.
    pub fn is_closed(&self) -> bool {
        self.closing.load(Ordering::SeqCst)
    }

    /// Closes the connection. Closing twice is an error.
    ///
    /// A running statement is interrupted and closes the connection itself
    /// when it returns.
    pub fn close(&self) -> Result<(), SqliteError> {
        if self.closing.swap(true, Ordering::SeqCst) {
            return Err(SqliteError::Closed);
        }
        self.interrupt.interrupt();

        let Some(mut guard) = self.conn.try_lock() else {
            trace!("sqlite connection busy, closing after the running statement");
            return Ok(());
        };
        match guard.take() {
            Some(conn) => conn.close().map_err(|(_, err)| SqliteError::Close(err)),
            None => Ok(()),
        }
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, SqliteError>,
    ) -> Result<T, SqliteError> {
        let result = {
            let guard = self.conn.lock();
            match guard.as_ref() {
                Some(conn) if !self.closing.load(Ordering::SeqCst) => f(conn),
                _ => Err(SqliteError::Closed),
            }
        };

        if self.closing.load(Ordering::SeqCst) {
            self.finish_close();
        }
        result
    }

    /// Closes a connection whose close was requested while it was in use.
    fn finish_close(&self) {
        let Some(conn) = self.conn.lock().take() else {
            return;
        };
        match conn.close() {
            Ok(()) => trace!("sqlite connection closed after interrupted statement"),
            Err((_, err)) => warn!(error = %err, "sqlite connection close failed"),
        }
    }
}

impl fmt::Debug for SqliteHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteHandle")
            .field("closed", &self.is_closed())
            .finish()
    }
}
