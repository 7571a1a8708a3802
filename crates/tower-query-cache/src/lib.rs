//! Query-result caching middleware for Tower services.
//!
//! A [`Cache`] looks up each request's key in a [`QueryCache`]. On a hit the
//! stored result is returned and the inner service is not called. On a miss
//! the inner service runs and a successful result is stored; failures are
//! passed through and never cached.
//!
//! The store is injected rather than owned by the layer, so one
//! [`QueryCache`] can back any number of layers and be inspected directly.
//!
//! # Features
//!
//! - **Injectable store**: cheap-clone [`QueryCache`] handle over shared entries
//! - **Single-flight (opt-in)**: concurrent misses for one key compute once
//! - **Event system**: Hit, Miss and NotStored events with the key
//! - **Flexible key extraction**: user-defined key extraction from requests
//!
//! # Examples
//!
//! ```
//! use tower_query_cache::{CacheLayer, QueryCache};
//! use tower::{ServiceBuilder, ServiceExt};
//!
//! # async fn example() -> Result<(), std::io::Error> {
//! let cache = QueryCache::builder()
//!     .name("users")
//!     .on_hit(|key| println!("cache hit for {}", key))
//!     .on_miss(|key| println!("cache miss for {}", key))
//!     .build();
//!
//! let service = ServiceBuilder::new()
//!     .layer(CacheLayer::new(cache.clone(), |query: &String| query.clone()))
//!     .service(tower::service_fn(|query: String| async move {
//!         Ok::<_, std::io::Error>(vec![format!("row for {}", query)])
//!     }));
//!
//! let first = service.clone().oneshot("SELECT * FROM users".to_string()).await?;
//! let second = service.oneshot("SELECT * FROM users".to_string()).await?;
//! assert_eq!(first, second);
//! assert_eq!(cache.len(), 1);
//! # Ok(())
//! # }
//! ```

mod events;
mod layer;
mod store;

pub use events::CacheEvent;
pub use layer::{CacheLayer, KeyExtractor};
pub use store::{QueryCache, QueryCacheBuilder};

use futures::future::BoxFuture;
use std::fmt;
use std::hash::Hash;
use std::task::{Context, Poll};
use tower::Service;

/// A Tower [`Service`] that serves repeated requests from a [`QueryCache`].
pub struct Cache<S, Req, K, V> {
    inner: S,
    cache: QueryCache<K, V>,
    key_extractor: KeyExtractor<Req, K>,
}

impl<S, Req, K, V> Cache<S, Req, K, V> {
    /// Creates a new `Cache` service wrapping the given service.
    pub fn new(inner: S, cache: QueryCache<K, V>, key_extractor: KeyExtractor<Req, K>) -> Self {
        Self {
            inner,
            cache,
            key_extractor,
        }
    }

    /// Returns the cache this service serves from.
    pub fn cache(&self) -> &QueryCache<K, V> {
        &self.cache
    }
}

impl<S, Req, K, V> Clone for Cache<S, Req, K, V>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            cache: self.cache.clone(),
            key_extractor: self.key_extractor.clone(),
        }
    }
}

impl<S, Req, K> Service<Req> for Cache<S, Req, K, S::Response>
where
    S: Service<Req> + Clone + Send + 'static,
    S::Response: Clone + Send + Sync + 'static,
    S::Error: Send + 'static,
    S::Future: Send + 'static,
    K: Hash + Eq + Clone + fmt::Display + Send + Sync + 'static,
    Req: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let key = (self.key_extractor)(&req);
        let cache = self.cache.clone();

        // Keep the service that was driven to readiness for this call
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move { cache.get_or_compute(key, move || inner.call(req)).await })
    }
}
