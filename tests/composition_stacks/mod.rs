//! Composition stack tests.
//!
//! The stacks mirror the composition guide
//! (crates/tower-query/src/composition.rs).
//!
//! - `database`: the canonical scope/retry/cache/logger stacks
//! - `order_verification`: runtime proof that layer order changes behavior
//! - `sqlite`: the same stacks over a real SQLite database

#![allow(dead_code)]

mod order_verification;
mod test_utils;
