//! Order verification tests.
//!
//! The same four interceptors stacked in a different order give different
//! observable behavior. These tests pin down the documented differences.

use std::time::Duration;

use tower::{ServiceBuilder, ServiceExt};
use tower_query::cache::{CacheLayer, QueryCache};
use tower_query::log::CallLogLayer;
use tower_query::retry::RetryLayer;
use tower_query::scope::{ScopeError, ScopeLayer, Scoped};

use super::test_utils::{flaky_query, users_query, Conn, DbError, Journal, MockDb, Rows};

const QUERY: &str = "SELECT id FROM users";

/// Retry outside the scope: every attempt gets a fresh connection.
#[tokio::test]
async fn retry_outside_scope_reacquires_per_attempt() {
    let journal = Journal::default();
    let db = MockDb::new(journal.clone());

    let service = ServiceBuilder::new()
        .layer(
            RetryLayer::<ScopeError<DbError, DbError>>::builder()
                .max_attempts(3)
                .fixed_backoff(Duration::ZERO)
                .build(),
        )
        .layer(ScopeLayer::new(db.clone()))
        .service(flaky_query(journal.clone(), 2));

    service.oneshot(QUERY.to_string()).await.unwrap();

    assert_eq!(
        journal.entries(),
        vec![
            "acquire 1",
            "query on 1",
            "release 1",
            "acquire 2",
            "query on 2",
            "release 2",
            "acquire 3",
            "query on 3",
            "release 3",
        ]
    );
}

/// Retry outside the scope also retries failed acquisitions.
#[tokio::test]
async fn retry_outside_scope_retries_acquisition() {
    let journal = Journal::default();
    let db = MockDb::new(journal.clone());
    db.refuse_connections();

    let service = ServiceBuilder::new()
        .layer(
            RetryLayer::<ScopeError<DbError, DbError>>::builder()
                .max_attempts(3)
                .fixed_backoff(Duration::ZERO)
                .build(),
        )
        .layer(ScopeLayer::new(db.clone()))
        .service(users_query(journal.clone()));

    let err = service.oneshot(QUERY.to_string()).await.unwrap_err();

    assert!(err.is_acquire());
    assert_eq!(
        journal.entries(),
        vec!["acquire failed", "acquire failed", "acquire failed"]
    );
}

/// Cache outside the scope: hits never touch the database.
#[tokio::test]
async fn cache_outside_scope_skips_acquisition_on_hit() {
    let journal = Journal::default();
    let db = MockDb::new(journal.clone());
    let cache: QueryCache<String, Rows> = QueryCache::new();

    let service = ServiceBuilder::new()
        .layer(CacheLayer::new(cache.clone(), |query: &String| query.clone()))
        .layer(ScopeLayer::new(db.clone()))
        .service(users_query(journal.clone()));

    service.clone().oneshot(QUERY.to_string()).await.unwrap();
    service.oneshot(QUERY.to_string()).await.unwrap();

    assert_eq!(db.acquired(), 1);
    assert_eq!(journal.entries(), vec!["acquire 1", "query on 1", "release 1"]);
}

/// Logger inside the scope and the retry: one log line per attempt, each
/// after the connection was opened.
#[tokio::test]
async fn logger_inside_retry_logs_every_attempt() {
    let journal = Journal::default();
    let db = MockDb::new(journal.clone());
    let j = journal.clone();

    let service = ServiceBuilder::new()
        .layer(ScopeLayer::new(db.clone()))
        .layer(
            RetryLayer::<DbError>::builder()
                .max_attempts(3)
                .fixed_backoff(Duration::ZERO)
                .build(),
        )
        .layer(
            CallLogLayer::builder(|scoped: &Scoped<Conn, String>| scoped.request().clone())
                .on_call(move |_, _| j.push("log"))
                .build(),
        )
        .service(flaky_query(journal.clone(), 2));

    service.oneshot(QUERY.to_string()).await.unwrap();

    assert_eq!(
        journal.entries(),
        vec![
            "acquire 1",
            "log",
            "query on 1",
            "log",
            "query on 1",
            "log",
            "query on 1",
            "release 1",
        ]
    );
}

/// Logger outside the retry: one log line per call, however many attempts.
#[tokio::test]
async fn logger_outside_retry_logs_once() {
    let journal = Journal::default();
    let db = MockDb::new(journal.clone());
    let j = journal.clone();

    let service = ServiceBuilder::new()
        .layer(
            CallLogLayer::builder(|query: &String| query.clone())
                .on_call(move |_, _| j.push("log"))
                .build(),
        )
        .layer(ScopeLayer::new(db.clone()))
        .layer(
            RetryLayer::<DbError>::builder()
                .max_attempts(3)
                .fixed_backoff(Duration::ZERO)
                .build(),
        )
        .service(flaky_query(journal.clone(), 2));

    service.oneshot(QUERY.to_string()).await.unwrap();

    let logs = journal.entries().iter().filter(|e| *e == "log").count();
    assert_eq!(logs, 1);
    assert_eq!(journal.entries()[0], "log");
}
