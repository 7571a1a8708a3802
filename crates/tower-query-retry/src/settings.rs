//! Per-call-site retry settings that can be loaded from configuration.

use std::time::Duration;

/// Plain retry settings: attempt budget, delay, and optional deadline.
///
/// With the `serde` feature enabled this deserializes from any serde
/// format; missing fields fall back to the defaults.
///
/// ```
/// # #[cfg(feature = "serde")]
/// # {
/// use tower_query_retry::{RetryLayer, RetrySettings};
///
/// let settings: RetrySettings = serde_json::from_str(r#"{ "max_attempts": 5, "delay_ms": 250 }"#).unwrap();
/// let layer = RetryLayer::<std::io::Error>::builder().settings(&settings).build();
/// assert_eq!(layer.max_attempts(), 5);
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RetrySettings {
    /// Total attempts, including the first one.
    pub max_attempts: usize,
    /// Fixed delay between attempts, in milliseconds.
    pub delay_ms: u64,
    /// Optional overall deadline across all attempts, in milliseconds.
    pub deadline_ms: Option<u64>,
}

impl RetrySettings {
    /// Default number of attempts.
    pub const DEFAULT_MAX_ATTEMPTS: usize = 3;
    /// Default delay between attempts.
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(2);

    /// The fixed delay as a [`Duration`].
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// The overall deadline as a [`Duration`], if any.
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            delay_ms: Self::DEFAULT_DELAY.as_millis() as u64,
            deadline_ms: None,
        }
    }
}
