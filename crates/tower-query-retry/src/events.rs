use std::time::{Duration, Instant};
use tower_query_core::events::InterceptEvent;

/// Events emitted by the retry middleware.
///
/// Attempt numbers are 1-based: the first call is attempt 1.
#[derive(Debug, Clone)]
pub enum RetryEvent {
    /// An attempt failed and another one will follow after `delay`.
    Retry {
        pattern_name: String,
        timestamp: Instant,
        attempt: usize,
        delay: Duration,
        error: String,
    },
    /// The operation succeeded (either on first try or after retries).
    Success {
        pattern_name: String,
        timestamp: Instant,
        attempts: usize,
    },
    /// The final allowed attempt failed; its error is returned.
    Error {
        pattern_name: String,
        timestamp: Instant,
        attempts: usize,
        error: String,
    },
    /// The error was rejected by the retry predicate and returned immediately.
    IgnoredError {
        pattern_name: String,
        timestamp: Instant,
        attempt: usize,
        error: String,
    },
    /// Waiting for another attempt would cross the overall deadline.
    DeadlineExceeded {
        pattern_name: String,
        timestamp: Instant,
        attempts: usize,
        error: String,
    },
}

impl InterceptEvent for RetryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RetryEvent::Retry { .. } => "Retry",
            RetryEvent::Success { .. } => "Success",
            RetryEvent::Error { .. } => "Error",
            RetryEvent::IgnoredError { .. } => "IgnoredError",
            RetryEvent::DeadlineExceeded { .. } => "DeadlineExceeded",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RetryEvent::Retry { timestamp, .. }
            | RetryEvent::Success { timestamp, .. }
            | RetryEvent::Error { timestamp, .. }
            | RetryEvent::IgnoredError { timestamp, .. }
            | RetryEvent::DeadlineExceeded { timestamp, .. } => *timestamp,
        }
    }

    fn instance_name(&self) -> &str {
        match self {
            RetryEvent::Retry { pattern_name, .. }
            | RetryEvent::Success { pattern_name, .. }
            | RetryEvent::Error { pattern_name, .. }
            | RetryEvent::IgnoredError { pattern_name, .. }
            | RetryEvent::DeadlineExceeded { pattern_name, .. } => pattern_name,
        }
    }
}
