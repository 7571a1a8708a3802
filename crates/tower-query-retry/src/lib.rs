//! Bounded retry middleware for Tower services.
//!
//! A failed call is re-invoked up to a fixed number of attempts, waiting a
//! delay between attempts. When every attempt fails, the error of the
//! **last** attempt is returned, not the first.
//!
//! # Features
//!
//! - **Interval functions**: fixed delay (default, 2s) or exponential backoff
//! - **Retry predicates**: errors rejected by the predicate are returned at once
//! - **Overall deadline**: stop early when the next delay would cross it
//! - **Event system**: every failed attempt is reported with its 1-based
//!   number and error text before the delay begins
//! - **`RetryLayer::run`**: the same loop for a plain closure, no service needed
//!
//! # Examples
//!
//! ```
//! use tower_query_retry::RetryLayer;
//! use tower::{ServiceBuilder, ServiceExt};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), String> {
//! let retry = RetryLayer::<String>::builder()
//!     .max_attempts(3)
//!     .fixed_backoff(Duration::from_millis(10))
//!     .on_retry(|attempt, delay, error| {
//!         eprintln!("attempt {} failed: {} (next in {:?})", attempt, error, delay);
//!     })
//!     .build();
//!
//! let service = ServiceBuilder::new()
//!     .layer(retry)
//!     .service(tower::service_fn(|query: String| async move {
//!         Ok::<_, String>(format!("rows for {}", query))
//!     }));
//!
//! let rows = service.oneshot("SELECT * FROM users".to_string()).await?;
//! # Ok(())
//! # }
//! ```

mod backoff;
mod config;
mod events;
mod layer;
mod policy;
mod settings;

pub use backoff::{ExponentialBackoff, FixedInterval, FnInterval, IntervalFunction};
pub use config::{RetryConfig, RetryConfigBuilder};
pub use events::RetryEvent;
pub use layer::RetryLayer;
pub use policy::{RetryPolicy, RetryPredicate};
pub use settings::RetrySettings;

use futures::future::{BoxFuture, Either};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Service, ServiceExt};

#[cfg(feature = "metrics")]
use metrics::counter;

#[cfg(feature = "tracing")]
use tracing::warn;

/// A Tower [`Service`] that retries failed requests.
///
/// Each attempt is a full call to the inner service with a clone of the
/// request, after waiting for the inner service to become ready.
pub struct Retry<S, E> {
    inner: S,
    config: Arc<RetryConfig<E>>,
}

impl<S, E> Retry<S, E> {
    /// Creates a new `Retry` service wrapping the given service.
    pub fn new(inner: S, config: Arc<RetryConfig<E>>) -> Self {
        Self { inner, config }
    }
}

impl<S, E> Clone for Retry<S, E>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S, Req, E> Service<Req> for Retry<S, E>
where
    S: Service<Req, Error = E> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    Req: Clone + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    type Response = S::Response;
    type Error = E;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        // The readied service runs the first attempt; later attempts wait
        // for readiness again.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let config = Arc::clone(&self.config);

        Box::pin(async move {
            let mut readied = true;
            run_attempts(&config, move || {
                if std::mem::take(&mut readied) {
                    Either::Left(inner.call(req.clone()))
                } else {
                    Either::Right(inner.clone().oneshot(req.clone()))
                }
            })
            .await
        })
    }
}

/// The retry loop shared by [`Retry`] and [`RetryLayer::run`].
pub(crate) async fn run_attempts<E, F, Fut, T>(config: &RetryConfig<E>, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let started = tokio::time::Instant::now();
    let mut attempt = 1;

    loop {
        #[cfg(feature = "metrics")]
        counter!("retry_attempts_total", "retry" => config.name.clone()).increment(1);

        let error = match op().await {
            Ok(response) => {
                #[cfg(feature = "metrics")]
                counter!("retry_calls_total", "retry" => config.name.clone(), "result" => "success")
                    .increment(1);

                config.event_listeners.emit(&RetryEvent::Success {
                    pattern_name: config.name.clone(),
                    timestamp: Instant::now(),
                    attempts: attempt,
                });
                return Ok(response);
            }
            Err(error) => error,
        };

        if !config.policy.should_retry(&error) {
            #[cfg(feature = "tracing")]
            warn!(retry = %config.name, attempt, error = %error, "error not retryable");

            #[cfg(feature = "metrics")]
            counter!("retry_calls_total", "retry" => config.name.clone(), "result" => "ignored")
                .increment(1);

            config
                .event_listeners
                .emit_with(|| RetryEvent::IgnoredError {
                    pattern_name: config.name.clone(),
                    timestamp: Instant::now(),
                    attempt,
                    error: error.to_string(),
                });
            return Err(error);
        }

        if attempt >= config.policy.max_attempts() {
            #[cfg(feature = "tracing")]
            warn!(retry = %config.name, attempts = attempt, error = %error, "retries exhausted");

            #[cfg(feature = "metrics")]
            counter!("retry_calls_total", "retry" => config.name.clone(), "result" => "exhausted")
                .increment(1);

            config.event_listeners.emit_with(|| RetryEvent::Error {
                pattern_name: config.name.clone(),
                timestamp: Instant::now(),
                attempts: attempt,
                error: error.to_string(),
            });
            return Err(error);
        }

        let delay = config.policy.next_backoff(attempt);

        if config.policy.would_exceed_deadline(started.elapsed(), delay) {
            #[cfg(feature = "tracing")]
            warn!(retry = %config.name, attempts = attempt, error = %error, "retry deadline exceeded");

            #[cfg(feature = "metrics")]
            counter!("retry_calls_total", "retry" => config.name.clone(), "result" => "deadline")
                .increment(1);

            config
                .event_listeners
                .emit_with(|| RetryEvent::DeadlineExceeded {
                    pattern_name: config.name.clone(),
                    timestamp: Instant::now(),
                    attempts: attempt,
                    error: error.to_string(),
                });
            return Err(error);
        }

        #[cfg(feature = "tracing")]
        warn!(retry = %config.name, attempt, error = %error, delay = ?delay, "attempt failed");

        config.event_listeners.emit_with(|| RetryEvent::Retry {
            pattern_name: config.name.clone(),
            timestamp: Instant::now(),
            attempt,
            delay,
            error: error.to_string(),
        });
        drop(error);

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        attempt += 1;
    }
}
