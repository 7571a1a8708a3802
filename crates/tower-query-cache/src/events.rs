use std::time::Instant;
use tower_query_core::events::InterceptEvent;

/// Events emitted by the query cache.
#[derive(Debug, Clone)]
pub enum CacheEvent {
    /// A stored result was returned without computing.
    Hit {
        pattern_name: String,
        timestamp: Instant,
        key: String,
    },
    /// No stored result; the operation is computed.
    Miss {
        pattern_name: String,
        timestamp: Instant,
        key: String,
    },
    /// The computation failed, so nothing was stored.
    NotStored {
        pattern_name: String,
        timestamp: Instant,
        key: String,
    },
}

impl InterceptEvent for CacheEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CacheEvent::Hit { .. } => "Hit",
            CacheEvent::Miss { .. } => "Miss",
            CacheEvent::NotStored { .. } => "NotStored",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CacheEvent::Hit { timestamp, .. }
            | CacheEvent::Miss { timestamp, .. }
            | CacheEvent::NotStored { timestamp, .. } => *timestamp,
        }
    }

    fn instance_name(&self) -> &str {
        match self {
            CacheEvent::Hit { pattern_name, .. }
            | CacheEvent::Miss { pattern_name, .. }
            | CacheEvent::NotStored { pattern_name, .. } => pattern_name,
        }
    }
}
