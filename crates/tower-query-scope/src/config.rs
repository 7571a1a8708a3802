//! Configuration for the resource scope.

use crate::events::ScopeEvent;
use crate::resource::ResourceManager;
use std::time::Duration;
use tower_query_core::{EventListeners, FnListener, UNNAMED};

/// Configuration for the resource scope.
pub struct ScopeConfig {
    pub(crate) name: String,
    pub(crate) event_listeners: EventListeners<ScopeEvent>,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            name: UNNAMED.to_string(),
            event_listeners: EventListeners::new(),
        }
    }
}

/// Builder for a [`ScopeLayer`](crate::ScopeLayer).
pub struct ScopeConfigBuilder<M> {
    manager: M,
    name: String,
    event_listeners: EventListeners<ScopeEvent>,
}

impl<M: ResourceManager> ScopeConfigBuilder<M> {
    /// Creates a builder around the given resource manager.
    pub fn new(manager: M) -> Self {
        Self {
            manager,
            name: UNNAMED.to_string(),
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the name of this scope (used in events, logs and metrics).
    ///
    /// Default: `"<unnamed>"`
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback invoked after each successful acquisition.
    pub fn on_acquired<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if matches!(event, ScopeEvent::Acquired { .. }) {
                f();
            }
        }));
        self
    }

    /// Registers a callback invoked when acquisition fails, with the error text.
    pub fn on_acquire_failed<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let ScopeEvent::AcquireFailed { error, .. } = event {
                f(error);
            }
        }));
        self
    }

    /// Registers a callback invoked after each successful release, with how
    /// long the handle was held.
    pub fn on_released<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let ScopeEvent::Released { held_for, .. } = event {
                f(*held_for);
            }
        }));
        self
    }

    /// Registers a callback invoked when a release fails, with the error text.
    ///
    /// The wrapped operation's result is still returned to the caller.
    pub fn on_release_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let ScopeEvent::ReleaseFailed { error, .. } = event {
                f(error);
            }
        }));
        self
    }

    /// Builds the scope layer.
    pub fn build(self) -> crate::ScopeLayer<M> {
        let config = ScopeConfig {
            name: self.name,
            event_listeners: self.event_listeners,
        };
        crate::ScopeLayer::from_parts(self.manager, config)
    }
}
