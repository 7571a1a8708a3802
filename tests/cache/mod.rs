//! Tests for the query cache.
//!
//! Test organization:
//! - cache_concurrency.rs: Concurrent misses with and without single-flight
//! - cache_keys.rs: Key extraction and verbatim key matching
//! - cache_events.rs: Hit, miss and not-stored callbacks

mod cache_concurrency;
mod cache_events;
mod cache_keys;
