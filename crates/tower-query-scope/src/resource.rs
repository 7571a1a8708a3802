//! Resource acquisition and release.

use futures::future::BoxFuture;
use std::future::Future;

/// Source of single-use resource handles (database connections, sessions, ...).
///
/// A [`ResourceScope`](crate::ResourceScope) calls [`acquire`](Self::acquire)
/// once per invocation and [`release`](Self::release) exactly once for every
/// handle it acquired, whatever the outcome of the wrapped operation.
pub trait ResourceManager: Send + Sync + 'static {
    /// The handle given to the wrapped operation.
    type Handle: Send + Sync + 'static;
    /// Error produced when acquiring or releasing a handle.
    type Error: Send + 'static;

    /// Obtains a fresh handle.
    fn acquire(&self) -> BoxFuture<'_, Result<Self::Handle, Self::Error>>;

    /// Releases a handle previously returned by [`acquire`](Self::acquire).
    ///
    /// Release runs from a drop guard, so it is synchronous.
    fn release(&self, handle: &Self::Handle) -> Result<(), Self::Error>;
}

/// A [`ResourceManager`] built from a pair of closures.
///
/// Created with [`resource_fn`].
#[derive(Clone)]
pub struct ResourceFn<A, R> {
    acquire: A,
    release: R,
}

/// Builds a [`ResourceManager`] from an async `acquire` closure and a
/// synchronous `release` closure.
///
/// # Examples
///
/// ```
/// use tower_query_scope::{resource_fn, ScopeLayer};
///
/// let layer = ScopeLayer::new(resource_fn(
///     || async { Ok::<_, std::io::Error>(String::from("conn")) },
///     |_conn: &String| Ok(()),
/// ));
/// ```
pub fn resource_fn<A, R>(acquire: A, release: R) -> ResourceFn<A, R> {
    ResourceFn { acquire, release }
}

impl<A, R, Fut, H, E> ResourceManager for ResourceFn<A, R>
where
    A: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<H, E>> + Send + 'static,
    R: Fn(&H) -> Result<(), E> + Send + Sync + 'static,
    H: Send + Sync + 'static,
    E: Send + 'static,
{
    type Handle = H;
    type Error = E;

    fn acquire(&self) -> BoxFuture<'_, Result<H, E>> {
        Box::pin((self.acquire)())
    }

    fn release(&self, handle: &H) -> Result<(), E> {
        (self.release)(handle)
    }
}
