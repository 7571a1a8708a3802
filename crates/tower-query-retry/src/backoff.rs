use std::time::Duration;

/// Computes the delay before the next attempt.
pub trait IntervalFunction: Send + Sync {
    /// Returns the delay to wait after the given failed attempt.
    ///
    /// `failed_attempts` is the number of attempts that have failed so far
    /// (1 after the first failure).
    fn next_interval(&self, failed_attempts: usize) -> Duration;
}

/// The same delay between every pair of attempts.
#[derive(Debug, Clone)]
pub struct FixedInterval {
    duration: Duration,
}

impl FixedInterval {
    /// Creates a fixed interval.
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl IntervalFunction for FixedInterval {
    fn next_interval(&self, _failed_attempts: usize) -> Duration {
        self.duration
    }
}

/// A delay that grows by `multiplier` after each failure, optionally capped.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    initial_interval: Duration,
    multiplier: f64,
    max_interval: Option<Duration>,
}

impl ExponentialBackoff {
    /// Creates an exponential backoff doubling from `initial_interval`.
    pub fn new(initial_interval: Duration) -> Self {
        Self {
            initial_interval,
            multiplier: 2.0,
            max_interval: None,
        }
    }

    /// Sets the growth factor.
    ///
    /// Negative factors are clamped to zero and NaN is treated as 1.0.
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = if multiplier.is_nan() {
            1.0
        } else {
            multiplier.max(0.0)
        };
        self
    }

    /// Caps the delay.
    pub fn max_interval(mut self, max_interval: Duration) -> Self {
        self.max_interval = Some(max_interval);
        self
    }
}

impl IntervalFunction for ExponentialBackoff {
    fn next_interval(&self, failed_attempts: usize) -> Duration {
        let exponent = failed_attempts.saturating_sub(1).min(i32::MAX as usize) as i32;
        let factor = self.multiplier.powi(exponent).min(u32::MAX as f64);
        let interval = Duration::try_from_secs_f64(self.initial_interval.as_secs_f64() * factor)
            .unwrap_or(Duration::MAX);

        match self.max_interval {
            Some(max) => interval.min(max),
            None => interval,
        }
    }
}

/// An interval computed by a closure.
pub struct FnInterval<F> {
    f: F,
}

impl<F> FnInterval<F>
where
    F: Fn(usize) -> Duration + Send + Sync,
{
    /// Wraps a closure taking the number of failed attempts.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> IntervalFunction for FnInterval<F>
where
    F: Fn(usize) -> Duration + Send + Sync,
{
    fn next_interval(&self, failed_attempts: usize) -> Duration {
        (self.f)(failed_attempts)
    }
}
