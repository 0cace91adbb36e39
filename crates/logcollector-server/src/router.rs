//! Request routing and path matching.
//!
//! The router owns the route table. Each registered [`Route`] is turned into
//! a ready-to-serve chain once, at registration:
//!
//! ```text
//! RequestLogger (debug only) → route middlewares… → BaseWrapper → handler
//! ```
//!
//! Path templates use `{name}` segments; captured values are stored in the
//! request extensions as [`PathParams`]. Paths are matched as received.
//!
//! # Example
//!
//! ```rust
//! use logcollector_core::{handler_fn, Reply};
//! use logcollector_server::{Route, Router};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.add_route(
//!     Route::new("GetUser", Method::GET, "/users/{userId}")
//!         .handler(handler_fn(|_h, _r| Box::pin(async { Ok(Reply::empty()) }))),
//!     false,
//! );
//! router.add_route(Route::new("Unbound", Method::GET, "/skipped"), false);
//!
//! assert_eq!(router.route_names(), vec!["GetUser"]);
//! ```

use std::collections::HashMap;

use http::{Method, StatusCode};
use logcollector_core::{BoxFuture, Handler, Request, ResponseError, ResponseWriter};
use logcollector_middleware::stages::RequestLogger;
use logcollector_middleware::{BoxedMiddleware, Pipeline};
use std::sync::Arc;

use crate::route::Route;
use crate::wrapper::{write_envelope, BaseWrapper};

/// Path parameters captured from a `{name}` template segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(HashMap<String, String>);

impl PathParams {
    /// Returns a parameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no parameters were captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A segment of a path template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    /// A literal segment (e.g., "users")
    Literal(String),

    /// A parameter segment (e.g., "{userId}")
    Param(String),
}

/// A registered route with its compiled chain.
#[derive(Clone)]
struct RouteEntry {
    name: String,
    method: Method,
    segments: Vec<PathSegment>,
    chain: Pipeline,
}

impl RouteEntry {
    /// Parses a path pattern into segments.
    fn parse_segments(pattern: &str) -> Vec<PathSegment> {
        split_path(pattern)
            .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => PathSegment::Param(name.to_string()),
                None => PathSegment::Literal(s.to_string()),
            })
            .collect()
    }

    /// Attempts to match this route's template against a path.
    fn match_path(&self, path: &str) -> Option<PathParams> {
        let path_segments: Vec<&str> = split_path(path).collect();

        if path_segments.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (pattern, actual) in self.segments.iter().zip(path_segments) {
            match pattern {
                PathSegment::Literal(expected) => {
                    if expected != actual {
                        return None;
                    }
                }
                PathSegment::Param(name) => {
                    if actual.is_empty() {
                        return None;
                    }
                    params.insert(name.clone(), actual.to_string());
                }
            }
        }

        Some(PathParams(params))
    }
}

/// Splits a path into segments without cleaning it: empty segments from
/// repeated or trailing slashes are kept.
fn split_path(path: &str) -> std::str::Split<'_, char> {
    path.strip_prefix('/').unwrap_or(path).split('/')
}

/// Outcome of looking a request up in the table.
enum Lookup<'r> {
    Found(&'r RouteEntry, PathParams),
    MethodNotAllowed,
    NotFound,
}

/// The route table.
///
/// `Router` implements [`Handler`]: it dispatches to the first route whose
/// method and template match. A path that matches no template gets `404`;
/// a path that matches only under other methods gets `405`. Both carry a
/// JSON error envelope.
#[derive(Clone, Default)]
pub struct Router {
    routes: Vec<RouteEntry>,
}

impl Router {
    /// Creates a new empty router.
    #[must_use]
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Registers a route and builds its handler chain.
    ///
    /// Routes without a business handler are skipped. When
    /// `request_logging` is set, a [`RequestLogger`] becomes the outermost
    /// layer of the chain.
    pub fn add_route(&mut self, route: Route, request_logging: bool) {
        let (name, method, pattern, handler, middlewares) = route.into_parts();
        let Some(handler) = handler else {
            tracing::debug!(route = %name, "route has no handler, skipping");
            return;
        };

        let mut stages: Vec<BoxedMiddleware> = Vec::with_capacity(middlewares.len() + 1);
        if request_logging {
            stages.push(Arc::new(RequestLogger::new()));
        }
        stages.extend(middlewares);

        let chain = Pipeline::builder()
            .stages(stages)
            .build(BaseWrapper::from_shared(handler));

        tracing::debug!(
            route = %name,
            method = %method,
            pattern = %pattern,
            stages = ?chain.stage_names(),
            "route registered"
        );

        self.routes.push(RouteEntry {
            segments: RouteEntry::parse_segments(&pattern),
            name,
            method,
            chain,
        });
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Returns the registered route names in order.
    #[must_use]
    pub fn route_names(&self) -> Vec<&str> {
        self.routes.iter().map(|r| r.name.as_str()).collect()
    }

    fn lookup(&self, method: &Method, path: &str) -> Lookup<'_> {
        let mut path_matched = false;
        for route in &self.routes {
            if let Some(params) = route.match_path(path) {
                if route.method == *method {
                    return Lookup::Found(route, params);
                }
                path_matched = true;
            }
        }

        if path_matched {
            Lookup::MethodNotAllowed
        } else {
            Lookup::NotFound
        }
    }
}

impl Handler for Router {
    fn serve<'a>(
        &'a self,
        w: &'a mut dyn ResponseWriter,
        request: &'a mut Request,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            match self.lookup(request.method(), request.uri().path()) {
                Lookup::Found(route, params) => {
                    request.extensions_mut().insert(params);
                    route.chain.serve(w, request).await;
                }
                Lookup::MethodNotAllowed => {
                    let error = ResponseError::custom("MethodNotAllowed", "method not allowed");
                    write_envelope(w, StatusCode::METHOD_NOT_ALLOWED, &error);
                }
                Lookup::NotFound => {
                    let error = ResponseError::custom("NotFound", "not found");
                    write_envelope(w, StatusCode::NOT_FOUND, &error);
                }
            }
        })
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.route_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use logcollector_core::{empty_body, handler_fn, BufferedResponse, Reply};
    use logcollector_middleware::Next;

    fn echo_param(name: &'static str) -> Route {
        Route::new(name, Method::GET, "/users/{userId}").handler(handler_fn(|_headers, request| {
            Box::pin(async move {
                let id = request
                    .extensions()
                    .get::<PathParams>()
                    .and_then(|p| p.get("userId"))
                    .unwrap_or_default()
                    .to_string();
                Ok(Reply::body(id))
            })
        }))
    }

    fn fixed(name: &'static str, method: Method, pattern: &'static str, body: &'static str) -> Route {
        Route::new(name, method, pattern).handler(handler_fn(move |_headers, _request| {
            Box::pin(async move { Ok(Reply::body(Bytes::from_static(body.as_bytes()))) })
        }))
    }

    async fn call(router: &Router, method: Method, path: &str) -> BufferedResponse {
        let mut w = BufferedResponse::new();
        let mut request = http::Request::builder()
            .method(method)
            .uri(path)
            .body(empty_body())
            .unwrap();
        router.serve(&mut w, &mut request).await;
        w
    }

    #[test]
    fn test_parse_segments() {
        assert_eq!(
            RouteEntry::parse_segments("/users/{userId}/posts"),
            vec![
                PathSegment::Literal("users".into()),
                PathSegment::Param("userId".into()),
                PathSegment::Literal("posts".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_path_params_extracted() {
        let mut router = Router::new();
        router.add_route(echo_param("GetUser"), false);

        let w = call(&router, Method::GET, "/users/42").await;
        assert_eq!(w.status(), Some(StatusCode::OK));
        assert_eq!(w.body(), b"42");
    }

    #[tokio::test]
    async fn test_first_match_wins() {
        let mut router = Router::new();
        router.add_route(fixed("Literal", Method::GET, "/users/me", "literal"), false);
        router.add_route(echo_param("Param"), false);

        assert_eq!(call(&router, Method::GET, "/users/me").await.body(), b"literal");
        assert_eq!(call(&router, Method::GET, "/users/7").await.body(), b"7");
    }

    #[test]
    fn test_parse_segments_keeps_empty() {
        assert_eq!(
            RouteEntry::parse_segments("/v1/log/"),
            vec![
                PathSegment::Literal("v1".into()),
                PathSegment::Literal("log".into()),
                PathSegment::Literal(String::new()),
            ]
        );
    }

    #[tokio::test]
    async fn test_paths_matched_raw() {
        let mut router = Router::new();
        router.add_route(fixed("Log", Method::POST, "/v1/log", "hit"), false);

        assert_eq!(call(&router, Method::POST, "/v1/log").await.body(), b"hit");
        for path in ["/v1/log/", "//v1//log", "/v1///log//"] {
            let w = call(&router, Method::POST, path).await;
            assert_eq!(w.status(), Some(StatusCode::NOT_FOUND), "{path}");
        }
    }

    #[tokio::test]
    async fn test_empty_segment_does_not_bind_param() {
        let mut router = Router::new();
        router.add_route(echo_param("GetUser"), false);

        let w = call(&router, Method::GET, "/users/").await;
        assert_eq!(w.status(), Some(StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn test_not_found_envelope() {
        let router = Router::new();
        let w = call(&router, Method::GET, "/missing").await;

        assert_eq!(w.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(w.body(), br#"{"code":"NotFound","message":"not found"}"#);
    }

    #[tokio::test]
    async fn test_method_not_allowed_envelope() {
        let mut router = Router::new();
        router.add_route(fixed("Log", Method::POST, "/v1/log", ""), false);

        let w = call(&router, Method::GET, "/v1/log").await;
        assert_eq!(w.status(), Some(StatusCode::METHOD_NOT_ALLOWED));
        assert_eq!(
            w.body(),
            br#"{"code":"MethodNotAllowed","message":"method not allowed"}"#
        );
    }

    #[test]
    fn test_route_without_handler_skipped() {
        let mut router = Router::new();
        router.add_route(Route::new("Nothing", Method::GET, "/nothing"), false);
        router.add_route(fixed("Something", Method::GET, "/something", "x"), true);

        assert_eq!(router.route_count(), 1);
        assert_eq!(router.route_names(), vec!["Something"]);
    }

    #[test]
    fn test_logger_is_outermost_when_enabled() {
        struct Marker;

        impl logcollector_middleware::Middleware for Marker {
            fn name(&self) -> &'static str {
                "marker"
            }

            fn process<'a>(
                &'a self,
                w: &'a mut dyn ResponseWriter,
                request: &'a mut Request,
                next: Next<'a>,
            ) -> BoxFuture<'a, ()> {
                next.run(w, request)
            }
        }

        let mut router = Router::new();
        router.add_route(
            fixed("Logged", Method::GET, "/logged", "").middleware(Marker),
            true,
        );
        router.add_route(
            fixed("Quiet", Method::GET, "/quiet", "").middleware(Marker),
            false,
        );

        assert_eq!(
            router.routes[0].chain.stage_names(),
            vec!["request_logger", "marker"]
        );
        assert_eq!(router.routes[1].chain.stage_names(), vec!["marker"]);
    }
}
