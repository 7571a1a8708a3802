use std::fmt;
use std::sync::Arc;

/// A request paired with the resource handle acquired for it.
///
/// This is the request type seen by every stage inside a
/// [`ResourceScope`](crate::ResourceScope). Cloning it (as a retry does
/// between attempts) shares the same handle; it never acquires a new one.
pub struct Scoped<H, Req> {
    handle: Arc<H>,
    request: Req,
}

impl<H, Req> Scoped<H, Req> {
    /// Pairs a handle with a request.
    pub fn new(handle: Arc<H>, request: Req) -> Self {
        Self { handle, request }
    }

    /// Returns the resource handle.
    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// Returns a shared pointer to the handle, e.g. to move it onto a
    /// blocking thread.
    pub fn shared_handle(&self) -> Arc<H> {
        Arc::clone(&self.handle)
    }

    /// Returns the request.
    pub fn request(&self) -> &Req {
        &self.request
    }

    /// Splits into the handle and the request.
    pub fn into_parts(self) -> (Arc<H>, Req) {
        (self.handle, self.request)
    }
}

impl<H, Req: Clone> Clone for Scoped<H, Req> {
    fn clone(&self) -> Self {
        Self {
            handle: Arc::clone(&self.handle),
            request: self.request.clone(),
        }
    }
}

impl<H, Req: fmt::Debug> fmt::Debug for Scoped<H, Req> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scoped")
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}
