use chrono::{DateTime, Utc};
use std::time::Instant;
use tower_query_core::events::InterceptEvent;

/// Events emitted by the call logger.
#[derive(Debug, Clone)]
pub enum CallEvent {
    /// A call is about to start.
    Started {
        pattern_name: String,
        timestamp: Instant,
        request_key: String,
        started_at: DateTime<Utc>,
    },
}

impl InterceptEvent for CallEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CallEvent::Started { .. } => "Started",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CallEvent::Started { timestamp, .. } => *timestamp,
        }
    }

    fn instance_name(&self) -> &str {
        match self {
            CallEvent::Started { pattern_name, .. } => pattern_name,
        }
    }
}
