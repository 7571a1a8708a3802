//! Common fixtures for composition stack tests.

use futures::future::BoxFuture;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::util::BoxCloneService;
use tower_query::scope::{ResourceManager, Scoped};

pub type Rows = Arc<Vec<String>>;

#[derive(Debug, Clone, PartialEq)]
pub struct DbError(pub String);

impl DbError {
    pub fn new(msg: &str) -> Self {
        Self(msg.to_string())
    }

    pub fn is_transient(&self) -> bool {
        self.0.contains("locked")
    }
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for DbError {}

/// Ordered record of what happened during a call.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

#[derive(Debug)]
pub struct Conn {
    pub id: usize,
}

/// Hands out numbered connections and journals every acquire and release.
#[derive(Clone)]
pub struct MockDb {
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
    refuse: Arc<AtomicBool>,
    journal: Journal,
}

impl MockDb {
    pub fn new(journal: Journal) -> Self {
        Self {
            opened: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
            refuse: Arc::new(AtomicBool::new(false)),
            journal,
        }
    }

    pub fn acquired(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn refuse_connections(&self) {
        self.refuse.store(true, Ordering::SeqCst);
    }
}

impl ResourceManager for MockDb {
    type Handle = Conn;
    type Error = DbError;

    fn acquire(&self) -> BoxFuture<'_, Result<Conn, DbError>> {
        Box::pin(async move {
            if self.refuse.load(Ordering::SeqCst) {
                self.journal.push("acquire failed");
                return Err(DbError::new("connection refused"));
            }
            let id = self.opened.fetch_add(1, Ordering::SeqCst) + 1;
            self.journal.push(format!("acquire {id}"));
            Ok(Conn { id })
        })
    }

    fn release(&self, conn: &Conn) -> Result<(), DbError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        self.journal.push(format!("release {}", conn.id));
        Ok(())
    }
}

/// Base operation that fails with "database is locked" `failures` times,
/// then returns the query text as its only row.
///
/// Every run is journaled as `query on <conn id>`.
pub fn flaky_query(
    journal: Journal,
    failures: usize,
) -> BoxCloneService<Scoped<Conn, String>, Rows, DbError> {
    let runs = Arc::new(AtomicUsize::new(0));
    BoxCloneService::new(tower::service_fn(move |scoped: Scoped<Conn, String>| {
        let run = runs.fetch_add(1, Ordering::SeqCst) + 1;
        journal.push(format!("query on {}", scoped.handle().id));
        async move {
            if run <= failures {
                Err(DbError::new("database is locked"))
            } else {
                Ok(Arc::new(vec![scoped.request().clone()]))
            }
        }
    }))
}

/// Base operation that never fails.
pub fn users_query(journal: Journal) -> BoxCloneService<Scoped<Conn, String>, Rows, DbError> {
    flaky_query(journal, 0)
}
