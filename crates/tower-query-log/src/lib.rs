//! Call logging for Tower services.
//!
//! [`CallLog`] records a wall-clock timestamp and a key derived from the
//! request exactly once per call, before the inner service is invoked. It
//! never changes the request, the response or the error, and the inner
//! service's future is returned as is.
//!
//! With the default `tracing` feature each call produces an `info` line:
//!
//! ```text
//! INFO executing query logger="users" query="SELECT * FROM users" started_at=2026-10-16T09:30:00.123+00:00
//! ```
//!
//! # Examples
//!
//! ```
//! use tower_query_log::CallLogLayer;
//! use tower::{ServiceBuilder, ServiceExt};
//!
//! # async fn example() -> Result<(), std::io::Error> {
//! let logger = CallLogLayer::builder(|query: &String| query.clone())
//!     .name("users")
//!     .on_call(|query, started_at| eprintln!("[{}] {}", started_at, query))
//!     .build();
//!
//! let service = ServiceBuilder::new()
//!     .layer(logger)
//!     .service(tower::service_fn(|query: String| async move {
//!         Ok::<_, std::io::Error>(query.len())
//!     }));
//!
//! let n = service.oneshot("SELECT * FROM users".to_string()).await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod events;
mod layer;

pub use config::{CallLogConfig, CallLogConfigBuilder, RequestKey};
pub use events::CallEvent;
pub use layer::CallLogLayer;

use chrono::Utc;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::Service;
use tower_query_core::UNNAMED;

#[cfg(feature = "metrics")]
use metrics::counter;

#[cfg(feature = "tracing")]
use tracing::{info, warn};

/// A Tower [`Service`] that logs each call before it starts.
pub struct CallLog<S, Req> {
    inner: S,
    config: Arc<CallLogConfig<Req>>,
}

impl<S, Req> CallLog<S, Req> {
    /// Creates a new `CallLog` wrapping the given service.
    pub fn new(inner: S, config: Arc<CallLogConfig<Req>>) -> Self {
        Self { inner, config }
    }
}

impl<S: Clone, Req> Clone for CallLog<S, Req> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S, Req> Service<Req> for CallLog<S, Req>
where
    S: Service<Req>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        record(&self.config, &request_key(&self.config, &req));
        self.inner.call(req)
    }
}

/// Logs `request_key` with the current time, outside of any service.
pub fn log_before_call(request_key: &str) {
    let started_at = Utc::now();

    #[cfg(feature = "tracing")]
    info!(logger = UNNAMED, query = %request_key, started_at = %started_at.to_rfc3339(), "executing query");

    #[cfg(feature = "metrics")]
    counter!("query_calls_total", "logger" => UNNAMED).increment(1);

    #[cfg(not(any(feature = "tracing", feature = "metrics")))]
    let _ = (request_key, started_at, UNNAMED);
}

/// Key logged when the extractor panics.
pub(crate) const UNAVAILABLE_KEY: &str = "<unavailable>";

/// Runs the configured extractor, containing any panic it raises.
pub(crate) fn request_key<Req>(config: &CallLogConfig<Req>, request: &Req) -> String {
    match std::panic::catch_unwind(AssertUnwindSafe(|| (config.request_key)(request))) {
        Ok(key) => key,
        Err(_) => {
            #[cfg(feature = "tracing")]
            warn!(logger = %config.name, "request key extractor panicked");

            UNAVAILABLE_KEY.to_string()
        }
    }
}

pub(crate) fn record<Req>(config: &CallLogConfig<Req>, request_key: &str) {
    let started_at = Utc::now();

    #[cfg(feature = "tracing")]
    info!(logger = %config.name, query = %request_key, started_at = %started_at.to_rfc3339(), "executing query");

    #[cfg(feature = "metrics")]
    counter!("query_calls_total", "logger" => config.name.clone()).increment(1);

    config.event_listeners.emit_with(|| CallEvent::Started {
        pattern_name: config.name.clone(),
        timestamp: Instant::now(),
        request_key: request_key.to_string(),
        started_at,
    });
}
