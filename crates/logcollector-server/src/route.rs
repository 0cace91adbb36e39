//! Route definitions.
//!
//! A [`Route`] names an endpoint and carries everything needed to build its
//! handler chain: the business handler and the route's own middleware list.
//!
//! # Example
//!
//! ```rust
//! use logcollector_core::{handler_fn, Reply};
//! use logcollector_middleware::stages::FormParser;
//! use logcollector_server::Route;
//! use http::Method;
//!
//! let route = Route::new("Echo", Method::GET, "/echo/{word}")
//!     .handler(handler_fn(|_headers, _request| Box::pin(async { Ok(Reply::body("hi")) })))
//!     .middleware(FormParser::new());
//!
//! assert_eq!(route.name(), "Echo");
//! assert!(route.has_handler());
//! ```

use http::Method;
use logcollector_core::BusinessHandler;
use logcollector_middleware::{BoxedMiddleware, Middleware};
use std::sync::Arc;

/// An endpoint definition.
#[derive(Clone)]
pub struct Route {
    name: String,
    method: Method,
    pattern: String,
    handler: Option<Arc<dyn BusinessHandler>>,
    middlewares: Vec<BoxedMiddleware>,
}

impl Route {
    /// Creates a route with no handler and no middleware.
    ///
    /// A route that never gets a handler is skipped when it is registered.
    pub fn new(name: impl Into<String>, method: Method, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method,
            pattern: pattern.into(),
            handler: None,
            middlewares: Vec::new(),
        }
    }

    /// Sets the business handler.
    #[must_use]
    pub fn handler<H: BusinessHandler>(mut self, handler: H) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Sets an already shared business handler.
    #[must_use]
    pub fn shared_handler(mut self, handler: Arc<dyn BusinessHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Appends a middleware. The first one added is the outermost.
    #[must_use]
    pub fn middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Returns the route name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the path template.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns `true` if a business handler is set.
    #[must_use]
    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    pub(crate) fn into_parts(
        self,
    ) -> (String, Method, String, Option<Arc<dyn BusinessHandler>>, Vec<BoxedMiddleware>) {
        (self.name, self.method, self.pattern, self.handler, self.middlewares)
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("has_handler", &self.handler.is_some())
            .field(
                "middlewares",
                &self.middlewares.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
