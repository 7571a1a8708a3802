use crate::{run_attempts, Retry, RetryConfig, RetryConfigBuilder};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tower::Layer;

/// A Tower [`Layer`] that applies retry logic to a service.
///
/// # Examples
///
/// ```
/// use tower_query_retry::RetryLayer;
/// use tower::ServiceBuilder;
/// use std::time::Duration;
///
/// # #[derive(Debug, Clone)]
/// # struct DbError;
/// # impl std::fmt::Display for DbError {
/// #     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str("db") }
/// # }
/// let retry_layer = RetryLayer::<DbError>::builder()
///     .max_attempts(5)
///     .fixed_backoff(Duration::from_millis(500))
///     .build();
///
/// let service = ServiceBuilder::new()
///     .layer(retry_layer)
///     .service(tower::service_fn(|query: String| async move {
///         Ok::<_, DbError>(vec![query])
///     }));
/// ```
pub struct RetryLayer<E> {
    config: Arc<RetryConfig<E>>,
}

impl<E> Clone for RetryLayer<E> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
        }
    }
}

impl<E> RetryLayer<E> {
    /// Creates a new `RetryLayer` with the given configuration.
    pub fn new(config: RetryConfig<E>) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Creates a new builder for configuring a retry layer.
    pub fn builder() -> RetryConfigBuilder<E> {
        RetryConfigBuilder::new()
    }

    /// Returns the total number of attempts allowed.
    pub fn max_attempts(&self) -> usize {
        self.config.policy.max_attempts()
    }

    /// Runs `op` under this retry policy without building a service.
    ///
    /// `op` is invoked until it succeeds or the attempt budget is spent.
    /// The error of the last attempt is returned.
    ///
    /// ```
    /// use tower_query_retry::RetryLayer;
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use std::time::Duration;
    ///
    /// # async fn example() {
    /// let calls = AtomicUsize::new(0);
    /// let retry = RetryLayer::<String>::builder()
    ///     .max_attempts(3)
    ///     .fixed_backoff(Duration::ZERO)
    ///     .build();
    ///
    /// let result = retry
    ///     .run(|| {
    ///         let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
    ///         async move { if n < 3 { Err(format!("failure {}", n)) } else { Ok(n) } }
    ///     })
    ///     .await;
    ///
    /// assert_eq!(result, Ok(3));
    /// # }
    /// ```
    pub async fn run<F, Fut, T>(&self, op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        run_attempts(&self.config, op).await
    }
}

impl<S, E> Layer<S> for RetryLayer<E> {
    type Service = Retry<S, E>;

    fn layer(&self, service: S) -> Self::Service {
        Retry::new(service, Arc::clone(&self.config))
    }
}
