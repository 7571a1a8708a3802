use crate::backoff::IntervalFunction;
use std::sync::Arc;
use std::time::Duration;

/// Determines whether an error should be retried.
pub type RetryPredicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// Attempt budget, delay schedule and error filter.
pub struct RetryPolicy<E> {
    pub(crate) max_attempts: usize,
    pub(crate) interval_fn: Arc<dyn IntervalFunction>,
    pub(crate) retry_predicate: Option<RetryPredicate<E>>,
    pub(crate) deadline: Option<Duration>,
}

impl<E> RetryPolicy<E> {
    /// Creates a policy. `max_attempts` counts the first attempt and is at least 1.
    pub fn new(max_attempts: usize, interval_fn: Arc<dyn IntervalFunction>) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interval_fn,
            retry_predicate: None,
            deadline: None,
        }
    }

    /// Returns the total number of attempts allowed.
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Checks if the given error should be retried.
    pub fn should_retry(&self, error: &E) -> bool {
        match &self.retry_predicate {
            Some(predicate) => predicate(error),
            None => true,
        }
    }

    /// Delay to wait after `failed_attempts` failures.
    pub fn next_backoff(&self, failed_attempts: usize) -> Duration {
        self.interval_fn.next_interval(failed_attempts)
    }

    /// Whether waiting `delay` more would cross the overall deadline.
    pub(crate) fn would_exceed_deadline(&self, elapsed: Duration, delay: Duration) -> bool {
        match self.deadline {
            Some(deadline) => elapsed.saturating_add(delay) > deadline,
            None => false,
        }
    }
}
