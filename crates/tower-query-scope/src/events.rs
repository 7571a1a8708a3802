use std::time::Instant;
use tower_query_core::events::InterceptEvent;

/// Events emitted by the resource scope.
#[derive(Debug, Clone)]
pub enum ScopeEvent {
    /// A handle was acquired; the wrapped operation is about to run.
    Acquired {
        pattern_name: String,
        timestamp: Instant,
    },
    /// Acquisition failed; the wrapped operation was not invoked.
    AcquireFailed {
        pattern_name: String,
        timestamp: Instant,
        error: String,
    },
    /// The handle was released.
    Released {
        pattern_name: String,
        timestamp: Instant,
        held_for: std::time::Duration,
    },
    /// Releasing the handle failed. The operation's own outcome is unaffected.
    ReleaseFailed {
        pattern_name: String,
        timestamp: Instant,
        error: String,
    },
}

impl InterceptEvent for ScopeEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ScopeEvent::Acquired { .. } => "Acquired",
            ScopeEvent::AcquireFailed { .. } => "AcquireFailed",
            ScopeEvent::Released { .. } => "Released",
            ScopeEvent::ReleaseFailed { .. } => "ReleaseFailed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            ScopeEvent::Acquired { timestamp, .. }
            | ScopeEvent::AcquireFailed { timestamp, .. }
            | ScopeEvent::Released { timestamp, .. }
            | ScopeEvent::ReleaseFailed { timestamp, .. } => *timestamp,
        }
    }

    fn instance_name(&self) -> &str {
        match self {
            ScopeEvent::Acquired { pattern_name, .. }
            | ScopeEvent::AcquireFailed { pattern_name, .. }
            | ScopeEvent::Released { pattern_name, .. }
            | ScopeEvent::ReleaseFailed { pattern_name, .. } => pattern_name,
        }
    }
}
