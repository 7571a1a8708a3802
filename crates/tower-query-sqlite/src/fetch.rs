use crate::connector::SqliteHandle;
use crate::error::SqliteError;
use crate::Rows;
use futures::future::BoxFuture;
use std::task::{Context, Poll};
use tower::Service;
use tower_query_scope::Scoped;

/// Base operation: runs the request's SQL on the scope's connection and
/// returns every row.
///
/// The statement runs on tokio's blocking pool. Rows come back behind an
/// `Arc`, so a cache in front of this service hands every caller the same
/// stored rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchAll;

impl FetchAll {
    /// Creates the service.
    pub fn new() -> Self {
        Self
    }
}

impl Service<Scoped<SqliteHandle, String>> for FetchAll {
    type Response = Rows;
    type Error = SqliteError;
    type Future = BoxFuture<'static, Result<Rows, SqliteError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, scoped: Scoped<SqliteHandle, String>) -> Self::Future {
        let (handle, sql) = scoped.into_parts();
        Box::pin(async move { tokio::task::spawn_blocking(move || handle.fetch_shared(&sql)).await? })
    }
}
