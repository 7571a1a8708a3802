use crate::events::CallEvent;
use crate::layer::CallLogLayer;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_query_core::{EventListeners, FnListener, UNNAMED};

/// Turns a request into the key written to the log.
pub type RequestKey<Req> = Arc<dyn Fn(&Req) -> String + Send + Sync>;

/// Configuration for the call logger.
pub struct CallLogConfig<Req> {
    pub(crate) name: String,
    pub(crate) request_key: RequestKey<Req>,
    pub(crate) event_listeners: EventListeners<CallEvent>,
}

/// Builder for a [`CallLogLayer`].
pub struct CallLogConfigBuilder<Req> {
    name: String,
    request_key: RequestKey<Req>,
    event_listeners: EventListeners<CallEvent>,
}

impl<Req> CallLogConfigBuilder<Req> {
    /// Creates a builder logging the key produced by `request_key`.
    pub fn new<F>(request_key: F) -> Self
    where
        F: Fn(&Req) -> String + Send + Sync + 'static,
    {
        Self {
            name: UNNAMED.to_string(),
            request_key: Arc::new(request_key),
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the name of this logger (used in events, logs and metrics).
    ///
    /// Default: `"<unnamed>"`
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback invoked before each call with the request key
    /// and the wall-clock start time.
    ///
    /// A panicking callback is contained and does not affect the call.
    pub fn on_call<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, DateTime<Utc>) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            let CallEvent::Started {
                request_key,
                started_at,
                ..
            } = event;
            f(request_key, *started_at);
        }));
        self
    }

    /// Builds the logger layer.
    pub fn build(self) -> CallLogLayer<Req> {
        CallLogLayer::from_config(CallLogConfig {
            name: self.name,
            request_key: self.request_key,
            event_listeners: self.event_listeners,
        })
    }
}
