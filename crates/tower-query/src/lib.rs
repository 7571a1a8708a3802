//! Composable interceptors around database operations for Tower services.
//!
//! `tower-query` bundles four interceptors that wrap a unit of data-access
//! work. Each one is a Tower [`Layer`](tower::Layer), lives in its own crate,
//! and is re-exported here behind a feature:
//!
//! - **Scope** (`scope` feature): acquires a resource handle per call and
//!   releases it on success, failure and cancellation
//! - **Cache** (`cache` feature): returns stored results for repeated keys
//!   and stores successful results on a miss
//! - **Retry** (`retry` feature): re-invokes a failing call a bounded number
//!   of times and surfaces the last error
//! - **Log** (`log` feature): records a timestamp and request key before
//!   each call
//!
//! # Usage
//!
//! ```toml
//! [dependencies]
//! tower-query = { version = "0.1", features = ["full"] }
//! ```
//!
//! # Composition
//!
//! Layers compose in any order with [`tower::ServiceBuilder`]; the first
//! `.layer()` is the outermost. The two common database stacks have helpers
//! in [`stack`]. See [`composition`] for how the layers interact.
//!
//! ```rust,no_run
//! # #[cfg(feature = "full")]
//! # {
//! use tower::{ServiceBuilder, ServiceExt};
//! use tower_query::{log::CallLogLayer, retry::RetryLayer, scope::{resource_fn, ScopeLayer, Scoped}};
//!
//! # async fn example() {
//! let connections = resource_fn(
//!     || async { Ok::<_, std::io::Error>(String::from("conn")) },
//!     |_conn: &String| Ok(()),
//! );
//!
//! let service = ServiceBuilder::new()
//!     .layer(CallLogLayer::new(|query: &String| query.clone()))
//!     .layer(ScopeLayer::new(connections))
//!     .layer(RetryLayer::builder().max_attempts(3).build())
//!     .service(tower::service_fn(|scoped: Scoped<String, String>| async move {
//!         Ok::<_, std::io::Error>(vec![scoped.request().clone()])
//!     }));
//!
//! let rows = service.oneshot("SELECT * FROM users".to_string()).await;
//! # }
//! # }
//! ```

pub mod composition;

#[cfg(feature = "scope")]
pub mod stack;

// Re-export core (always available)
pub use tower_query_core as core;

#[cfg(feature = "cache")]
pub use tower_query_cache as cache;

#[cfg(feature = "log")]
pub use tower_query_log as log;

#[cfg(feature = "retry")]
pub use tower_query_retry as retry;

#[cfg(feature = "scope")]
pub use tower_query_scope as scope;
