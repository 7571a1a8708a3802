//! Scoped resource acquisition for Tower services.
//!
//! A [`ResourceScope`] acquires a fresh handle from a [`ResourceManager`]
//! before each call, hands it to the inner service as part of a
//! [`Scoped`] request, and releases it afterwards. Release happens exactly
//! once on every exit path: success, failure, or the call's future being
//! dropped mid-flight.
//!
//! - Acquisition failure is returned as [`ScopeError::Acquire`] and the
//!   inner service is never called. The scope does not retry acquisition;
//!   put a retry layer *outside* the scope for that.
//! - Release failure is logged and emitted as an event. It never replaces
//!   the operation's own result or error.
//!
//! # Examples
//!
//! ```
//! use tower_query_scope::{resource_fn, ScopeLayer, Scoped};
//! use tower::{ServiceBuilder, ServiceExt};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let connections = resource_fn(
//!     || async { Ok::<_, std::io::Error>(String::from("connection#1")) },
//!     |conn: &String| {
//!         println!("closing {}", conn);
//!         Ok(())
//!     },
//! );
//!
//! let service = ServiceBuilder::new()
//!     .layer(ScopeLayer::new(connections))
//!     .service(tower::service_fn(|scoped: Scoped<String, String>| async move {
//!         Ok::<_, std::io::Error>(vec![format!("{} on {}", scoped.request(), scoped.handle())])
//!     }));
//!
//! let rows = service.oneshot("SELECT * FROM users".to_string()).await?;
//! assert_eq!(rows.len(), 1);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod events;
mod layer;
mod resource;
mod scoped;

pub use config::{ScopeConfig, ScopeConfigBuilder};
pub use error::ScopeError;
pub use events::ScopeEvent;
pub use layer::ScopeLayer;
pub use resource::{resource_fn, ResourceFn, ResourceManager};
pub use scoped::Scoped;

use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::Service;

#[cfg(feature = "metrics")]
use metrics::counter;

#[cfg(feature = "tracing")]
use tracing::{debug, error, warn};

/// A Tower [`Service`] that wraps each call in a resource scope.
pub struct ResourceScope<S, M> {
    inner: S,
    manager: Arc<M>,
    config: Arc<ScopeConfig>,
}

impl<S, M> ResourceScope<S, M> {
    /// Creates a new `ResourceScope` wrapping the given service.
    pub fn new(inner: S, manager: Arc<M>, config: Arc<ScopeConfig>) -> Self {
        Self {
            inner,
            manager,
            config,
        }
    }
}

impl<S: Clone, M> Clone for ResourceScope<S, M> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            manager: Arc::clone(&self.manager),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S, M, Req> Service<Req> for ResourceScope<S, M>
where
    M: ResourceManager,
    M::Error: fmt::Display,
    S: Service<Scoped<M::Handle, Req>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: Send + 'static,
    Req: Send + 'static,
{
    type Response = S::Response;
    type Error = ScopeError<M::Error, S::Error>;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(ScopeError::Operation)
    }

    fn call(&mut self, request: Req) -> Self::Future {
        // Keep the service that was polled ready; leave a clone behind
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let manager = Arc::clone(&self.manager);
        let config = Arc::clone(&self.config);

        Box::pin(async move {
            run_scoped(&manager, &config, move |handle| {
                inner.call(Scoped::new(handle, request))
            })
            .await
        })
    }
}

/// Acquires a handle, runs `op` with it, and releases it through a guard.
pub(crate) async fn run_scoped<M, F, Fut, T, E>(
    manager: &Arc<M>,
    config: &Arc<ScopeConfig>,
    op: F,
) -> Result<T, ScopeError<M::Error, E>>
where
    M: ResourceManager,
    M::Error: fmt::Display,
    F: FnOnce(Arc<M::Handle>) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let handle = match manager.acquire().await {
        Ok(handle) => Arc::new(handle),
        Err(err) => {
            #[cfg(feature = "tracing")]
            warn!(scope = %config.name, error = %err, "resource acquisition failed");

            #[cfg(feature = "metrics")]
            counter!("scope_acquisitions_total", "scope" => config.name.clone(), "result" => "failed")
                .increment(1);

            config
                .event_listeners
                .emit_with(|| ScopeEvent::AcquireFailed {
                    pattern_name: config.name.clone(),
                    timestamp: Instant::now(),
                    error: err.to_string(),
                });
            return Err(ScopeError::Acquire(err));
        }
    };

    #[cfg(feature = "tracing")]
    debug!(scope = %config.name, "resource acquired");

    #[cfg(feature = "metrics")]
    counter!("scope_acquisitions_total", "scope" => config.name.clone(), "result" => "ok")
        .increment(1);

    config.event_listeners.emit(&ScopeEvent::Acquired {
        pattern_name: config.name.clone(),
        timestamp: Instant::now(),
    });

    let guard = HandleGuard {
        manager: Arc::clone(manager),
        handle: Arc::clone(&handle),
        config: Arc::clone(config),
        acquired_at: Instant::now(),
    };

    let result = op(handle).await;

    // Release before handing the result back
    drop(guard);

    result.map_err(ScopeError::Operation)
}

/// Releases its handle when dropped.
struct HandleGuard<M>
where
    M: ResourceManager,
    M::Error: fmt::Display,
{
    manager: Arc<M>,
    handle: Arc<M::Handle>,
    config: Arc<ScopeConfig>,
    acquired_at: Instant,
}

impl<M> Drop for HandleGuard<M>
where
    M: ResourceManager,
    M::Error: fmt::Display,
{
    fn drop(&mut self) {
        let config = &self.config;
        match self.manager.release(&self.handle) {
            Ok(()) => {
                #[cfg(feature = "tracing")]
                debug!(scope = %config.name, "resource released");

                #[cfg(feature = "metrics")]
                counter!("scope_releases_total", "scope" => config.name.clone(), "result" => "ok")
                    .increment(1);

                config.event_listeners.emit(&ScopeEvent::Released {
                    pattern_name: config.name.clone(),
                    timestamp: Instant::now(),
                    held_for: self.acquired_at.elapsed(),
                });
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                error!(scope = %config.name, error = %err, "resource release failed");

                #[cfg(feature = "metrics")]
                counter!("scope_releases_total", "scope" => config.name.clone(), "result" => "failed")
                    .increment(1);

                config
                    .event_listeners
                    .emit_with(|| ScopeEvent::ReleaseFailed {
                        pattern_name: config.name.clone(),
                        timestamp: Instant::now(),
                        error: err.to_string(),
                    });
            }
        }
    }
}
