//! # Composition Guide
//!
//! How the interceptors behave when stacked, and how to pick an order.
//!
//! ## Declaration Order
//!
//! `ServiceBuilder` wraps in declaration order: the first `.layer()` call is
//! the outermost and sees the request first.
//!
//! ```text
//! ServiceBuilder::new()
//!     .layer(log)      // outermost, runs first
//!     .layer(scope)    // acquires a handle, passes Scoped<H, Req> inward
//!     .layer(retry)    // re-invokes everything below it
//!     .layer(cache)    // innermost interceptor
//!     .service(base)   // receives Scoped<H, Req>
//! ```
//!
//! Request → Log → Scope → Retry → Cache → base, and the result travels back
//! out through the same layers in reverse.
//!
//! ## What Each Layer Needs From Its Neighbours
//!
//! | Layer | Request it accepts | Passes inward | Error it returns |
//! |-------|--------------------|---------------|------------------|
//! | `CallLogLayer` | any `Req` | `Req` unchanged | inner error unchanged |
//! | `ScopeLayer` | any `Req` | `Scoped<M::Handle, Req>` | `ScopeError<M::Error, E>` |
//! | `RetryLayer` | `Req: Clone` | a clone per attempt | last inner error |
//! | `CacheLayer` | any `Req` (key extracted) | `Req` unchanged on a miss | inner error unchanged |
//!
//! Layers placed *below* a scope see `Scoped<H, Req>`; their key extractors
//! and request types must use it (`scoped.request()` gives the caller's
//! request). Layers placed *above* a scope see the caller's `Req` and, for
//! errors, the scope's `ScopeError`.
//!
//! ## The Two Canonical Stacks
//!
//! ### `ResourceScope(Retry(base))`
//!
//! See [`stack::scoped_retry`](crate::stack). One handle is acquired per call
//! and every attempt reuses it; the handle is released once, after the last
//! attempt. Acquisition failures are **not** retried, because the retry sits
//! inside the scope. To retry acquisition as well, put a second retry above
//! the scope:
//!
//! ```text
//! ServiceBuilder::new()
//!     .layer(RetryLayer::<ScopeError<_, _>>::builder().build())  // retries acquisition
//!     .layer(scope)
//!     .layer(retry)                                              // retries the query
//!     .service(base)
//! ```
//!
//! ### `ResourceScope(Cache(base))`
//!
//! See [`stack::scoped_cache`](crate::stack). The cache is consulted inside
//! the scope, so a handle is acquired and released even when the result
//! comes from the cache. When acquisition is expensive, prefer
//! `Cache(ResourceScope(base))`: hits then never touch the resource.
//!
//! ## Retry Around Cache
//!
//! Each retry attempt is a full call to the next layer. With the cache below
//! the retry, every attempt looks the key up again:
//!
//! - failures are never stored, so a retried miss recomputes;
//! - if another caller stored the key between two attempts, the next attempt
//!   is a hit and the computation is skipped.
//!
//! ## Concurrency
//!
//! A [`QueryCache`](tower_query_cache::QueryCache) is shared by every
//! service built from it. Without single-flight, two concurrent misses on
//! the same key both compute and the later write wins. Enable
//! `single_flight(true)` on the cache builder to compute once per key while
//! later callers wait for the stored value.
//!
//! Each call through a `ScopeLayer` acquires its own handle; handles are not
//! pooled or shared between concurrent calls.
//!
//! ## Cancellation
//!
//! Dropping a call's future is always safe:
//!
//! - a scope releases its handle,
//! - a retry stops, including in the middle of a delay,
//! - a single-flight cache lets the next waiter compute.
