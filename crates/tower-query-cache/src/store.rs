//! The shared result store behind every [`CacheLayer`](crate::CacheLayer).

use crate::events::CacheEvent;
use hashbrown::HashMap;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Instant;
use tower_query_core::{EventListeners, FnListener, UNNAMED};

#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter, describe_gauge, gauge};

#[cfg(feature = "tracing")]
use tracing::debug;

/// A key-to-result store shared by every service built from it.
///
/// Cloning a `QueryCache` is cheap and yields a handle to the same entries,
/// so one cache can be created up front and injected into several layers,
/// or inspected and warmed from tests.
///
/// Keys are used verbatim. Only successful results are stored, and entries
/// are never evicted or expired.
///
/// # Concurrency
///
/// By default two concurrent misses for the same key may both compute; the
/// last one to finish wins. With [`single_flight`](QueryCacheBuilder::single_flight)
/// enabled, the first caller computes while later callers for that key wait
/// and then read the stored value. If the computing caller fails or is
/// cancelled, the next waiter computes instead.
pub struct QueryCache<K, V> {
    shared: Arc<Shared<K, V>>,
}

struct Shared<K, V> {
    name: String,
    entries: RwLock<HashMap<K, V>>,
    in_flight: Option<InFlight<K>>,
    event_listeners: EventListeners<CacheEvent>,
}

impl<K, V> Clone for QueryCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<K, V> fmt::Debug for QueryCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("name", &self.shared.name)
            .field("len", &self.shared.entries.read().len())
            .field("single_flight", &self.shared.in_flight.is_some())
            .finish()
    }
}

impl<K, V> Default for QueryCache<K, V>
where
    K: Hash + Eq + Clone + fmt::Display + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> QueryCache<K, V>
where
    K: Hash + Eq + Clone + fmt::Display + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates an empty, unnamed cache without single-flight.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a new builder.
    pub fn builder() -> QueryCacheBuilder<K, V> {
        QueryCacheBuilder::new()
    }

    /// Returns the name of this cache.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Returns whether concurrent misses for one key are collapsed.
    pub fn is_single_flight(&self) -> bool {
        self.shared.in_flight.is_some()
    }

    /// Returns a clone of the stored value without recording a hit or miss.
    pub fn get(&self, key: &K) -> Option<V> {
        self.shared.entries.read().get(key).cloned()
    }

    /// Returns whether a value is stored for `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.shared.entries.read().contains_key(key)
    }

    /// Stores a value, returning the one it replaced.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        let (previous, size) = {
            let mut entries = self.shared.entries.write();
            let previous = entries.insert(key, value);
            (previous, entries.len())
        };

        #[cfg(feature = "metrics")]
        gauge!("cache_size", "cache" => self.shared.name.clone()).set(size as f64);
        #[cfg(not(feature = "metrics"))]
        let _ = size;

        previous
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.shared.entries.read().len()
    }

    /// Returns `true` when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.shared.entries.read().is_empty()
    }

    /// Returns the stored value for `key`, or runs `compute` and stores its
    /// successful result.
    ///
    /// A failed computation is returned unchanged and nothing is stored, so
    /// the next call for the same key computes again.
    pub async fn get_or_compute<F, Fut, E>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.lookup(&key) {
            return Ok(value);
        }

        let ticket = self.shared.in_flight.as_ref().map(|f| f.join(key.clone()));
        let _permit = match &ticket {
            Some(ticket) => Some(ticket.gate.lock().await),
            None => None,
        };

        // Whoever held the gate may have stored the value while we waited
        if ticket.is_some() {
            if let Some(value) = self.lookup(&key) {
                return Ok(value);
            }
        }

        self.record_miss(&key);

        match compute().await {
            Ok(value) => {
                self.insert(key, value.clone());
                Ok(value)
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                debug!(cache = %self.shared.name, key = %key, "compute failed, nothing cached");

                self.shared
                    .event_listeners
                    .emit_with(|| CacheEvent::NotStored {
                        pattern_name: self.shared.name.clone(),
                        timestamp: Instant::now(),
                        key: key.to_string(),
                    });
                Err(err)
            }
        }
    }

    /// Looks up `key`, recording a hit when found.
    fn lookup(&self, key: &K) -> Option<V> {
        let value = self.shared.entries.read().get(key).cloned()?;

        #[cfg(feature = "metrics")]
        counter!("cache_requests_total", "cache" => self.shared.name.clone(), "result" => "hit")
            .increment(1);

        #[cfg(feature = "tracing")]
        debug!(cache = %self.shared.name, key = %key, "cache hit");

        self.shared.event_listeners.emit_with(|| CacheEvent::Hit {
            pattern_name: self.shared.name.clone(),
            timestamp: Instant::now(),
            key: key.to_string(),
        });

        Some(value)
    }

    fn record_miss(&self, key: &K) {
        #[cfg(feature = "metrics")]
        counter!("cache_requests_total", "cache" => self.shared.name.clone(), "result" => "miss")
            .increment(1);

        #[cfg(feature = "tracing")]
        debug!(cache = %self.shared.name, key = %key, "cache miss");

        self.shared.event_listeners.emit_with(|| CacheEvent::Miss {
            pattern_name: self.shared.name.clone(),
            timestamp: Instant::now(),
            key: key.to_string(),
        });
    }
}

/// Builder for [`QueryCache`].
pub struct QueryCacheBuilder<K, V> {
    name: String,
    single_flight: bool,
    event_listeners: EventListeners<CacheEvent>,
    _marker: std::marker::PhantomData<fn() -> (K, V)>,
}

impl<K, V> QueryCacheBuilder<K, V>
where
    K: Hash + Eq + Clone + fmt::Display + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - name: `"<unnamed>"`
    /// - single_flight: false
    pub fn new() -> Self {
        Self {
            name: UNNAMED.to_string(),
            single_flight: false,
            event_listeners: EventListeners::new(),
            _marker: std::marker::PhantomData,
        }
    }

    /// Sets the name for this cache (used in events, logs and metrics).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Collapses concurrent misses for the same key into one computation.
    pub fn single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }

    /// Registers a callback invoked on a cache hit, with the key.
    pub fn on_hit<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CacheEvent::Hit { key, .. } = event {
                f(key);
            }
        }));
        self
    }

    /// Registers a callback invoked on a cache miss, with the key.
    pub fn on_miss<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CacheEvent::Miss { key, .. } = event {
                f(key);
            }
        }));
        self
    }

    /// Registers a callback invoked when a failed computation leaves the
    /// cache untouched.
    pub fn on_not_stored<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CacheEvent::NotStored { key, .. } = event {
                f(key);
            }
        }));
        self
    }

    /// Builds the cache.
    pub fn build(self) -> QueryCache<K, V> {
        #[cfg(feature = "metrics")]
        {
            describe_counter!(
                "cache_requests_total",
                "Total number of cache lookups (hits and misses)"
            );
            describe_gauge!("cache_size", "Current number of entries in the cache");
        }

        QueryCache {
            shared: Arc::new(Shared {
                name: self.name,
                entries: RwLock::new(HashMap::new()),
                in_flight: self.single_flight.then(InFlight::new),
                event_listeners: self.event_listeners,
            }),
        }
    }
}

impl<K, V> Default for QueryCacheBuilder<K, V>
where
    K: Hash + Eq + Clone + fmt::Display + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Per-key gates for computations currently running.
struct InFlight<K> {
    flights: Mutex<HashMap<K, Flight>>,
}

struct Flight {
    gate: Arc<tokio::sync::Mutex<()>>,
    holders: usize,
}

impl<K: Hash + Eq + Clone> InFlight<K> {
    fn new() -> Self {
        Self {
            flights: Mutex::new(HashMap::new()),
        }
    }

    /// Registers interest in `key` and returns the gate shared by everyone
    /// currently interested in it.
    fn join(&self, key: K) -> FlightTicket<'_, K> {
        let gate = {
            let mut flights = self.flights.lock();
            let flight = flights.entry(key.clone()).or_insert_with(|| Flight {
                gate: Arc::new(tokio::sync::Mutex::new(())),
                holders: 0,
            });
            flight.holders += 1;
            Arc::clone(&flight.gate)
        };

        FlightTicket {
            in_flight: self,
            key,
            gate,
        }
    }

    fn leave(&self, key: &K) {
        let mut flights = self.flights.lock();
        if let Some(flight) = flights.get_mut(key) {
            flight.holders -= 1;
            if flight.holders == 0 {
                flights.remove(key);
            }
        }
    }
}

/// Membership in a key's flight; leaves it when dropped.
struct FlightTicket<'a, K: Hash + Eq + Clone> {
    in_flight: &'a InFlight<K>,
    key: K,
    gate: Arc<tokio::sync::Mutex<()>>,
}

impl<K: Hash + Eq + Clone> Drop for FlightTicket<'_, K> {
    fn drop(&mut self) {
        self.in_flight.leave(&self.key);
    }
}
