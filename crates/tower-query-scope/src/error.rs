//! Error types for the resource scope.

use std::fmt;

/// Errors returned by a [`ResourceScope`](crate::ResourceScope).
///
/// `A` is the resource manager's error, `E` the wrapped operation's error.
/// Release failures never appear here: they are reported through events
/// and tracing, and the operation's outcome is returned as-is.
#[derive(Debug)]
pub enum ScopeError<A, E> {
    /// No handle could be obtained. The operation was not invoked.
    Acquire(A),
    /// The wrapped operation failed.
    Operation(E),
}

impl<A: fmt::Display, E: fmt::Display> fmt::Display for ScopeError<A, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeError::Acquire(e) => write!(f, "failed to acquire resource: {}", e),
            ScopeError::Operation(e) => write!(f, "operation failed: {}", e),
        }
    }
}

impl<A, E> std::error::Error for ScopeError<A, E>
where
    A: std::error::Error + 'static,
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScopeError::Acquire(e) => Some(e),
            ScopeError::Operation(e) => Some(e),
        }
    }
}

impl<A: Clone, E: Clone> Clone for ScopeError<A, E> {
    fn clone(&self) -> Self {
        match self {
            ScopeError::Acquire(e) => ScopeError::Acquire(e.clone()),
            ScopeError::Operation(e) => ScopeError::Operation(e.clone()),
        }
    }
}

impl<A, E> ScopeError<A, E> {
    /// Returns `true` if no handle could be acquired.
    pub fn is_acquire(&self) -> bool {
        matches!(self, ScopeError::Acquire(_))
    }

    /// Extracts the operation's error, if the operation ran and failed.
    pub fn into_operation(self) -> Option<E> {
        match self {
            ScopeError::Operation(e) => Some(e),
            ScopeError::Acquire(_) => None,
        }
    }
}
