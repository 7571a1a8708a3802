use crate::backoff::{ExponentialBackoff, FixedInterval, IntervalFunction};
use crate::events::RetryEvent;
use crate::layer::RetryLayer;
use crate::policy::{RetryPolicy, RetryPredicate};
use crate::settings::RetrySettings;
use std::sync::Arc;
use std::time::Duration;
use tower_query_core::events::{EventListeners, FnListener};
use tower_query_core::UNNAMED;

/// Configuration for the retry middleware.
pub struct RetryConfig<E> {
    pub(crate) policy: RetryPolicy<E>,
    pub(crate) event_listeners: EventListeners<RetryEvent>,
    pub(crate) name: String,
}

impl<E> RetryConfig<E> {
    /// Creates a new builder.
    pub fn builder() -> RetryConfigBuilder<E> {
        RetryConfigBuilder::new()
    }

    /// Wraps this configuration in a layer.
    pub fn layer(self) -> RetryLayer<E> {
        RetryLayer::new(self)
    }
}

/// Builder for [`RetryConfig`].
pub struct RetryConfigBuilder<E> {
    max_attempts: usize,
    interval_fn: Option<Arc<dyn IntervalFunction>>,
    retry_predicate: Option<RetryPredicate<E>>,
    deadline: Option<Duration>,
    event_listeners: EventListeners<RetryEvent>,
    name: String,
}

impl<E> Default for RetryConfigBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> RetryConfigBuilder<E> {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - max_attempts: 3
    /// - backoff: fixed, 2 seconds
    /// - retry predicate: none (every error is retried)
    /// - deadline: none
    /// - name: `"<unnamed>"`
    pub fn new() -> Self {
        Self {
            max_attempts: RetrySettings::DEFAULT_MAX_ATTEMPTS,
            interval_fn: None,
            retry_predicate: None,
            deadline: None,
            event_listeners: EventListeners::new(),
            name: UNNAMED.to_string(),
        }
    }

    /// Sets the maximum number of attempts.
    ///
    /// This includes the initial attempt, so `max_attempts(3)` means
    /// 1 initial attempt + 2 retries. Zero is treated as 1.
    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets a fixed delay between attempts.
    pub fn fixed_backoff(mut self, duration: Duration) -> Self {
        self.interval_fn = Some(Arc::new(FixedInterval::new(duration)));
        self
    }

    /// Sets an exponential backoff doubling from `initial_interval`.
    pub fn exponential_backoff(mut self, initial_interval: Duration) -> Self {
        self.interval_fn = Some(Arc::new(ExponentialBackoff::new(initial_interval)));
        self
    }

    /// Sets a custom interval function.
    pub fn backoff<I>(mut self, interval_fn: I) -> Self
    where
        I: IntervalFunction + 'static,
    {
        self.interval_fn = Some(Arc::new(interval_fn));
        self
    }

    /// Sets a predicate to determine which errors should be retried.
    ///
    /// Errors rejected by the predicate are returned immediately.
    pub fn retry_on<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.retry_predicate = Some(Arc::new(predicate));
        self
    }

    /// Bounds the total time spent across all attempts.
    ///
    /// Measured from the start of the first attempt. When waiting the next
    /// delay would cross it, the last error is returned instead.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Applies attempt count, fixed delay and deadline from loaded settings.
    pub fn settings(mut self, settings: &RetrySettings) -> Self {
        self.max_attempts = settings.max_attempts;
        self.interval_fn = Some(Arc::new(FixedInterval::new(settings.delay())));
        self.deadline = settings.deadline();
        self
    }

    /// Sets the name for this retry instance (used in events, logs and metrics).
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback invoked after each failed attempt that will be
    /// retried, before the delay begins.
    ///
    /// # Callback Signature
    /// `Fn(usize, Duration, &str)`: the failed attempt number (1-based),
    /// the delay before the next attempt, and the error text.
    ///
    /// # Example
    /// ```rust,no_run
    /// use tower_query_retry::RetryLayer;
    /// use std::time::Duration;
    ///
    /// let layer = RetryLayer::<std::io::Error>::builder()
    ///     .max_attempts(5)
    ///     .fixed_backoff(Duration::from_secs(1))
    ///     .on_retry(|attempt, delay, error| {
    ///         eprintln!("attempt {} failed: {}; retrying in {:?}", attempt, error, delay);
    ///     })
    ///     .build();
    /// ```
    pub fn on_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, Duration, &str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Retry {
                attempt,
                delay,
                error,
                ..
            } = event
            {
                f(*attempt, *delay, error);
            }
        }));
        self
    }

    /// Registers a callback when an operation succeeds, with the number of
    /// attempts it took.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Success { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    /// Registers a callback when all attempts are exhausted, with the
    /// attempt count and the last error text.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, &str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Error {
                attempts, error, ..
            } = event
            {
                f(*attempts, error);
            }
        }));
        self
    }

    /// Registers a callback when an error is rejected by the retry predicate.
    pub fn on_ignored_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::IgnoredError { error, .. } = event {
                f(error);
            }
        }));
        self
    }

    /// Registers a callback when the deadline stops further attempts.
    pub fn on_deadline_exceeded<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::DeadlineExceeded { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    /// Builds the configuration.
    pub fn build_config(self) -> RetryConfig<E> {
        let interval_fn = self
            .interval_fn
            .unwrap_or_else(|| Arc::new(FixedInterval::new(RetrySettings::DEFAULT_DELAY)));

        let mut policy = RetryPolicy::new(self.max_attempts, interval_fn);
        policy.retry_predicate = self.retry_predicate;
        policy.deadline = self.deadline;

        RetryConfig {
            policy,
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }

    /// Builds the retry layer.
    pub fn build(self) -> RetryLayer<E> {
        RetryLayer::new(self.build_config())
    }
}
