use crate::{Cache, QueryCache};
use std::sync::Arc;
use tower::Layer;

/// Extracts the cache key from a request.
pub type KeyExtractor<Req, K> = Arc<dyn Fn(&Req) -> K + Send + Sync>;

/// A Tower [`Layer`] that serves repeated requests from a [`QueryCache`].
///
/// Every service produced by this layer, and every clone of it, reads and
/// writes the same injected cache.
///
/// # Examples
///
/// ```
/// use tower_query_cache::{CacheLayer, QueryCache};
/// use tower::ServiceBuilder;
///
/// let cache: QueryCache<String, Vec<String>> = QueryCache::builder().name("users").build();
///
/// let service = ServiceBuilder::new()
///     .layer(CacheLayer::new(cache.clone(), |query: &String| query.clone()))
///     .service(tower::service_fn(|query: String| async move {
///         Ok::<_, std::io::Error>(vec![query])
///     }));
/// ```
pub struct CacheLayer<Req, K, V> {
    cache: QueryCache<K, V>,
    key_extractor: KeyExtractor<Req, K>,
}

impl<Req, K, V> CacheLayer<Req, K, V> {
    /// Creates a layer reading and writing `cache`, keyed by `key_extractor`.
    pub fn new<F>(cache: QueryCache<K, V>, key_extractor: F) -> Self
    where
        F: Fn(&Req) -> K + Send + Sync + 'static,
    {
        Self {
            cache,
            key_extractor: Arc::new(key_extractor),
        }
    }

    /// Returns the cache this layer serves from.
    pub fn cache(&self) -> &QueryCache<K, V> {
        &self.cache
    }
}

impl<Req, K, V> Clone for CacheLayer<Req, K, V> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            key_extractor: Arc::clone(&self.key_extractor),
        }
    }
}

impl<S, Req, K, V> Layer<S> for CacheLayer<Req, K, V> {
    type Service = Cache<S, Req, K, V>;

    fn layer(&self, service: S) -> Self::Service {
        Cache::new(service, self.cache.clone(), Arc::clone(&self.key_extractor))
    }
}
