//! Core infrastructure for tower-query.
//!
//! This crate holds what every interceptor shares:
//! - The event system used for observability ([`EventListeners`], [`FnListener`])
//! - The [`InterceptEvent`] trait implemented by each interceptor's event enum
//! - The default instance name used when a builder is not given one

pub mod events;

pub use events::{EventListener, EventListeners, FnListener, InterceptEvent};

/// Name given to interceptor instances that were not explicitly named.
pub const UNNAMED: &str = "<unnamed>";
