//! Event system shared by all interceptors.
//!
//! Each interceptor defines its own event enum and emits it through an
//! [`EventListeners`] collection. Listeners are the pluggable log sink of
//! the workspace: they observe, they never steer. A listener that panics
//! is isolated so the wrapped call still returns its own outcome.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Trait for events emitted by interceptors.
pub trait InterceptEvent: Send + Sync + fmt::Debug {
    /// Returns the kind of event (e.g., "hit", "retry", "released").
    fn event_type(&self) -> &'static str;

    /// Returns when this event occurred.
    fn timestamp(&self) -> Instant;

    /// Returns the name of the interceptor instance that emitted this event.
    fn instance_name(&self) -> &str;
}

/// Trait for listening to interceptor events.
pub trait EventListener<E: InterceptEvent>: Send + Sync {
    /// Called when an event occurs.
    fn on_event(&self, event: &E);
}

/// Type alias for boxed event listeners.
pub type BoxedEventListener<E> = Arc<dyn EventListener<E>>;

/// A collection of event listeners.
#[derive(Clone)]
pub struct EventListeners<E: InterceptEvent> {
    listeners: Vec<BoxedEventListener<E>>,
}

impl<E: InterceptEvent> EventListeners<E> {
    /// Creates a new empty event listener collection.
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Adds a listener to the collection.
    pub fn add<L>(&mut self, listener: L)
    where
        L: EventListener<E> + 'static,
    {
        self.listeners.push(Arc::new(listener));
    }

    /// Emits an event to all registered listeners.
    ///
    /// A panicking listener is caught and the remaining listeners are
    /// still called; `emit` itself always returns normally.
    pub fn emit(&self, event: &E) {
        for listener in &self.listeners {
            let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                listener.on_event(event);
            }));
        }
    }

    /// Builds and emits an event only when at least one listener is registered.
    ///
    /// Events that carry formatted error text use this to skip the
    /// formatting entirely on unobserved instances.
    pub fn emit_with<F>(&self, make_event: F)
    where
        F: FnOnce() -> E,
    {
        if self.listeners.is_empty() {
            return;
        }
        self.emit(&make_event());
    }

    /// Returns true if there are no listeners.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Returns the number of listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl<E: InterceptEvent> Default for EventListeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: InterceptEvent> fmt::Debug for EventListeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListeners")
            .field("len", &self.listeners.len())
            .finish()
    }
}

/// A closure-backed event listener.
pub struct FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    f: F,
    _phantom: std::marker::PhantomData<fn(&E)>,
}

impl<E, F> FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    /// Creates a new function-based listener.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<E, F> EventListener<E> for FnListener<E, F>
where
    E: InterceptEvent,
    F: Fn(&E) + Send + Sync,
{
    fn on_event(&self, event: &E) {
        (self.f)(event)
    }
}
