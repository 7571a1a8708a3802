use crate::config::{ScopeConfig, ScopeConfigBuilder};
use crate::resource::ResourceManager;
use crate::{run_scoped, ResourceScope, ScopeError};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tower::Layer;

/// A Tower [`Layer`] that runs each call inside a freshly acquired resource scope.
///
/// The wrapped service receives [`Scoped<M::Handle, Req>`](crate::Scoped)
/// instead of `Req`.
///
/// # Examples
///
/// ```
/// use tower_query_scope::{resource_fn, Scoped, ScopeLayer};
/// use tower::{Layer, ServiceExt};
///
/// # async fn example() {
/// let layer = ScopeLayer::builder(resource_fn(
///     || async { Ok::<_, std::io::Error>(42u32) },
///     |_conn: &u32| Ok(()),
/// ))
/// .name("users-db")
/// .build();
///
/// let service = layer.layer(tower::service_fn(|scoped: Scoped<u32, String>| async move {
///     Ok::<_, std::io::Error>(format!("{} via {}", scoped.request(), scoped.handle()))
/// }));
///
/// let rows = service.oneshot("SELECT 1".to_string()).await.unwrap();
/// assert_eq!(rows, "SELECT 1 via 42");
/// # }
/// ```
pub struct ScopeLayer<M> {
    manager: Arc<M>,
    config: Arc<ScopeConfig>,
}

impl<M> Clone for ScopeLayer<M> {
    fn clone(&self) -> Self {
        Self {
            manager: Arc::clone(&self.manager),
            config: Arc::clone(&self.config),
        }
    }
}

impl<M: ResourceManager> ScopeLayer<M> {
    /// Creates a scope layer with default configuration.
    pub fn new(manager: M) -> Self {
        Self::from_parts(manager, ScopeConfig::default())
    }

    /// Creates a builder for configuring a scope layer.
    pub fn builder(manager: M) -> ScopeConfigBuilder<M> {
        ScopeConfigBuilder::new(manager)
    }

    pub(crate) fn from_parts(manager: M, config: ScopeConfig) -> Self {
        Self {
            manager: Arc::new(manager),
            config: Arc::new(config),
        }
    }

    /// Runs `op` with a freshly acquired handle and releases it afterwards.
    ///
    /// This is the scope without a service around it: acquisition failure
    /// returns [`ScopeError::Acquire`] without calling `op`, and the handle
    /// is released exactly once on success, failure, or if the returned
    /// future is dropped.
    pub async fn with_resource<F, Fut, T, E>(&self, op: F) -> Result<T, ScopeError<M::Error, E>>
    where
        F: FnOnce(Arc<M::Handle>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        M::Error: fmt::Display,
    {
        run_scoped(&self.manager, &self.config, op).await
    }
}

impl<S, M> Layer<S> for ScopeLayer<M> {
    type Service = ResourceScope<S, M>;

    fn layer(&self, service: S) -> Self::Service {
        ResourceScope::new(service, Arc::clone(&self.manager), Arc::clone(&self.config))
    }
}
