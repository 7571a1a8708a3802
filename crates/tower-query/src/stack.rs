//! The two canonical database stacks.
//!
//! Both put a [`ScopeLayer`] outermost so every call gets its own resource
//! handle. Any other order can be built directly with
//! [`tower::ServiceBuilder`].

use tower::ServiceBuilder;
use tower_query_scope::{ResourceScope, ScopeLayer};

#[cfg(feature = "cache")]
use tower_query_cache::{Cache, CacheLayer, QueryCache};
#[cfg(feature = "cache")]
use tower_query_scope::{ResourceManager, Scoped};

#[cfg(feature = "retry")]
use tower_query_retry::{Retry, RetryLayer};

/// `ResourceScope(Retry(base))`: one handle per call, with every retry
/// attempt running inside that same handle's lifetime.
///
/// A failure to acquire the handle is not retried; wrap the result in
/// another [`RetryLayer`] for that.
///
/// ```
/// use tower::ServiceExt;
/// use tower_query::retry::RetryLayer;
/// use tower_query::scope::{resource_fn, ScopeLayer, Scoped};
/// use tower_query::stack::scoped_retry;
/// use std::time::Duration;
///
/// # async fn example() {
/// let scope = ScopeLayer::new(resource_fn(
///     || async { Ok::<_, std::io::Error>(1u32) },
///     |_: &u32| Ok(()),
/// ));
/// let retry = RetryLayer::builder()
///     .max_attempts(3)
///     .fixed_backoff(Duration::from_millis(100))
///     .build();
///
/// let service = scoped_retry(
///     scope,
///     retry,
///     tower::service_fn(|scoped: Scoped<u32, String>| async move {
///         Ok::<_, std::io::Error>(format!("{} via #{}", scoped.request(), scoped.handle()))
///     }),
/// );
///
/// let rows = service.oneshot("SELECT * FROM users".to_string()).await.unwrap();
/// # }
/// ```
#[cfg(feature = "retry")]
pub fn scoped_retry<M, E, S>(
    scope: ScopeLayer<M>,
    retry: RetryLayer<E>,
    base: S,
) -> ResourceScope<Retry<S, E>, M> {
    ServiceBuilder::new().layer(scope).layer(retry).service(base)
}

/// `ResourceScope(Cache(base))`: one handle per call, with the cache
/// consulted inside the scope.
///
/// The handle is acquired and released on hits as well as misses.
/// `key` derives the cache key from the caller's request; the handle is not
/// part of the key.
///
/// ```
/// use tower::ServiceExt;
/// use tower_query::cache::QueryCache;
/// use tower_query::scope::{resource_fn, ScopeLayer, Scoped};
/// use tower_query::stack::scoped_cache;
///
/// # async fn example() {
/// let scope = ScopeLayer::new(resource_fn(
///     || async { Ok::<_, std::io::Error>(1u32) },
///     |_: &u32| Ok(()),
/// ));
/// let cache = QueryCache::new();
///
/// let service = scoped_cache(
///     scope,
///     cache.clone(),
///     |query: &String| query.clone(),
///     tower::service_fn(|scoped: Scoped<u32, String>| async move {
///         Ok::<_, std::io::Error>(vec![scoped.request().clone()])
///     }),
/// );
///
/// service.clone().oneshot("SELECT * FROM users".to_string()).await.unwrap();
/// service.oneshot("SELECT * FROM users".to_string()).await.unwrap();
/// assert_eq!(cache.len(), 1);
/// # }
/// ```
#[cfg(feature = "cache")]
pub fn scoped_cache<M, Req, K, V, S, F>(
    scope: ScopeLayer<M>,
    cache: QueryCache<K, V>,
    key: F,
    base: S,
) -> ResourceScope<Cache<S, Scoped<M::Handle, Req>, K, V>, M>
where
    M: ResourceManager,
    F: Fn(&Req) -> K + Send + Sync + 'static,
{
    let cache = CacheLayer::new(cache, move |scoped: &Scoped<M::Handle, Req>| {
        key(scoped.request())
    });

    ServiceBuilder::new().layer(scope).layer(cache).service(base)
}
