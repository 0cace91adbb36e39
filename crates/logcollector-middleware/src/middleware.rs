//! Core middleware trait and types.
//!
//! This module defines the [`Middleware`] trait that every pipeline stage
//! implements. A stage receives the response writer, the request and a
//! [`Next`] handle to the rest of the chain.
//!
//! # Example
//!
//! ```
//! use logcollector_middleware::{Middleware, Next};
//! use logcollector_core::{BoxFuture, Request, ResponseWriter};
//!
//! struct PoweredBy;
//!
//! impl Middleware for PoweredBy {
//!     fn name(&self) -> &'static str {
//!         "powered_by"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         w: &'a mut dyn ResponseWriter,
//!         request: &'a mut Request,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, ()> {
//!         Box::pin(async move {
//!             w.headers_mut().insert("x-powered-by", "logcollector".parse().unwrap());
//!             next.run(w, request).await;
//!         })
//!     }
//! }
//! ```

use logcollector_core::{BoxFuture, Handler, Request, ResponseWriter};
use std::sync::Arc;

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The core middleware trait.
///
/// # Invariants
///
/// - A stage either runs `next` exactly once or writes a response itself
///   (short-circuit).
/// - A stage that observes the response must not alter what downstream
///   stages wrote.
pub trait Middleware: Send + Sync + 'static {
    /// Returns the unique name of this middleware stage.
    ///
    /// This name is used for logging and debugging.
    fn name(&self) -> &'static str;

    /// Processes the request through this middleware.
    ///
    /// # Arguments
    ///
    /// * `w` - The response writer
    /// * `request` - The incoming HTTP request
    /// * `next` - Handle to the remaining stages and the handler
    fn process<'a>(
        &'a self,
        w: &'a mut dyn ResponseWriter,
        request: &'a mut Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, ()>;
}

/// Handle to the remainder of a middleware chain.
///
/// Running it invokes the next stage, or the terminal handler once no
/// stages remain. It is consumed on use so a stage can run it at most once:
///
/// ```compile_fail
/// use logcollector_middleware::Next;
/// use logcollector_core::{Request, ResponseWriter};
///
/// fn twice(next: Next<'_>, w: &mut dyn ResponseWriter, request: &mut Request) {
///     let _ = next.run(w, request);
///     let _ = next.run(w, request);
/// }
/// ```
pub struct Next<'a> {
    stages: &'a [BoxedMiddleware],
    endpoint: &'a dyn Handler,
}

impl<'a> Next<'a> {
    /// Creates a chain over `stages` ending in `endpoint`.
    pub fn new(stages: &'a [BoxedMiddleware], endpoint: &'a dyn Handler) -> Self {
        Self { stages, endpoint }
    }

    /// Returns the number of stages still to run.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.stages.len()
    }

    /// Invokes the next middleware or the handler.
    pub fn run<'b>(self, w: &'b mut dyn ResponseWriter, request: &'b mut Request) -> BoxFuture<'b, ()>
    where
        'a: 'b,
    {
        match self.stages.split_first() {
            Some((stage, rest)) => stage.process(w, request, Next::new(rest, self.endpoint)),
            None => self.endpoint.serve(w, request),
        }
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.stages.len())
            .finish_non_exhaustive()
    }
}
