//! Fetches users from a SQLite database three ways: with a logged query,
//! through a retrying scope, and through a caching scope.
//!
//! Run with: `cargo run -p tower-query-sqlite --example fetch_users`
//!
//! Log lines go to stderr at debug level, so cache hits and misses show up
//! next to the query and retry lines.

use std::time::Duration;
use tower::{ServiceBuilder, ServiceExt};
use tower_query::cache::QueryCache;
use tower_query::log::CallLogLayer;
use tower_query::retry::RetryLayer;
use tower_query::scope::{ResourceManager, ScopeLayer};
use tower_query::stack::{scoped_cache, scoped_retry};
use tower_query_sqlite::{FetchAll, SqliteConnector, SqliteError};
use tracing::Level;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_writer(std::io::stderr)
        .init();

    let dir = tempfile::tempdir()?;
    let connector = SqliteConnector::new(dir.path().join("users.db"));
    seed(&connector).await?;

    // 1. Log the query, then run it on a fresh connection
    let logged = ServiceBuilder::new()
        .layer(CallLogLayer::builder(|query: &String| query.clone()).name("users").build())
        .layer(ScopeLayer::builder(connector.clone()).name("users-db").build())
        .service(FetchAll);
    let users = logged.oneshot("SELECT * FROM users".to_string()).await?;
    println!("{:?}", users);

    // 2. One connection, up to 3 attempts one second apart
    let retrying = scoped_retry(
        ScopeLayer::new(connector.clone()),
        RetryLayer::<SqliteError>::builder()
            .name("fetch-users")
            .max_attempts(3)
            .fixed_backoff(Duration::from_secs(1))
            .build(),
        FetchAll,
    );
    let users = retrying.oneshot("SELECT * FROM users".to_string()).await?;
    println!("{:?}", users);

    // 3. Same query twice: a miss, then a hit served from the cache
    let cache = QueryCache::builder().name("users").build();
    let caching = scoped_cache(
        ScopeLayer::new(connector),
        cache,
        |query: &String| query.clone(),
        FetchAll,
    );
    let users = caching
        .clone()
        .oneshot("SELECT * FROM users".to_string())
        .await?;
    println!("{:?}", users);

    let users_again = caching.oneshot("SELECT * FROM users".to_string()).await?;
    println!("{:?}", users_again);

    Ok(())
}

async fn seed(connector: &SqliteConnector) -> Result<(), SqliteError> {
    let handle = connector.acquire().await?;
    handle.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
             id INTEGER PRIMARY KEY,
             name TEXT NOT NULL,
             email TEXT NOT NULL
         );
         INSERT INTO users (name, email) VALUES
             ('Alice', 'alice@example.com'),
             ('Bob', 'bob@example.com');",
    )?;
    connector.release(&handle)
}
