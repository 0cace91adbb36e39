//! CORS (Cross-Origin Resource Sharing) middleware.
//!
//! The server installs this stage in front of the route table, so it sees
//! every request before routing.
//!
//! ## Preflight Requests
//!
//! A preflight is an `OPTIONS` request carrying both `Origin` and
//! `Access-Control-Request-Method`. Preflights are answered here and never
//! reach a route:
//!
//! | Condition | Status |
//! |-----------|--------|
//! | `OPTIONS` from an origin that is not allowed | 200, no CORS headers |
//! | `OPTIONS` from an allowed origin without a requested method | 400 |
//! | requested method not allowed | 405 |
//! | a requested header not allowed | 403 |
//! | otherwise | 200 with allow headers |
//!
//! ## Simple Requests
//!
//! Requests from an allowed origin get `Access-Control-Allow-Origin` before
//! the route runs. Requests without an `Origin` header, or from an origin
//! that is not allowed, pass through unchanged.
//!
//! ## Example
//!
//! ```
//! use logcollector_middleware::stages::CorsMiddleware;
//! use http::Method;
//!
//! let cors = CorsMiddleware::builder()
//!     .allow_origins(["https://app.example.com", "https://admin.example.com"])
//!     .allow_methods([Method::GET, Method::POST])
//!     .allow_headers(["Content-Type", "X-Request-ID"])
//!     .build();
//! assert!(cors.config().origins().is_allowed("https://app.example.com"));
//! ```

use crate::middleware::{Middleware, Next};
use http::{HeaderValue, Method, StatusCode};
use logcollector_core::{BoxFuture, Request, ResponseWriter};

/// CORS header names.
pub mod headers {
    /// `Access-Control-Allow-Origin` header.
    pub const ALLOW_ORIGIN: &str = "access-control-allow-origin";
    /// `Access-Control-Allow-Methods` header.
    pub const ALLOW_METHODS: &str = "access-control-allow-methods";
    /// `Access-Control-Allow-Headers` header.
    pub const ALLOW_HEADERS: &str = "access-control-allow-headers";
    /// `Access-Control-Request-Method` header (preflight).
    pub const REQUEST_METHOD: &str = "access-control-request-method";
    /// `Access-Control-Request-Headers` header (preflight).
    pub const REQUEST_HEADERS: &str = "access-control-request-headers";
    /// `Origin` header.
    pub const ORIGIN: &str = "origin";
    /// `Vary` header.
    pub const VARY: &str = "vary";
}

/// Request headers a preflight may always ask for.
const ALWAYS_ALLOWED_HEADERS: [&str; 4] = ["accept", "accept-language", "content-language", "origin"];

const WILDCARD: &str = "*";

/// Represents the set of allowed origins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    /// Allow any origin (wildcard `*`).
    Any,
    /// Allow specific origins, in configured order.
    List(Vec<String>),
}

impl AllowedOrigins {
    /// Builds the set from a configured list; a `*` entry allows any origin.
    pub fn from_list<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let origins: Vec<String> = origins.into_iter().map(Into::into).collect();
        if origins.iter().any(|o| o == WILDCARD) {
            Self::Any
        } else {
            Self::List(origins)
        }
    }

    /// Checks if an origin is allowed.
    #[must_use]
    pub fn is_allowed(&self, origin: &str) -> bool {
        match self {
            Self::Any => true,
            Self::List(origins) => origins.iter().any(|o| o == origin),
        }
    }

    /// Returns the `Access-Control-Allow-Origin` value for an allowed origin.
    fn header_value(&self, origin: &str) -> Option<HeaderValue> {
        match self {
            Self::Any => Some(HeaderValue::from_static(WILDCARD)),
            Self::List(_) => HeaderValue::from_str(origin).ok(),
        }
    }

    /// Responses differ per origin only when several specific origins exist.
    fn varies(&self) -> bool {
        matches!(self, Self::List(origins) if origins.len() > 1)
    }
}

/// Configuration for CORS middleware.
#[derive(Debug, Clone)]
pub struct CorsConfig {
    origins: AllowedOrigins,
    methods: Vec<Method>,
    /// Lowercased header names.
    headers: Vec<String>,
}

impl CorsConfig {
    /// Returns the allowed origins.
    #[must_use]
    pub fn origins(&self) -> &AllowedOrigins {
        &self.origins
    }

    /// Returns the allowed methods.
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Returns the allowed request headers, lowercased.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    fn any_header(&self) -> bool {
        self.headers.iter().any(|h| h == WILDCARD)
    }

    fn header_allowed(&self, name: &str) -> bool {
        ALWAYS_ALLOWED_HEADERS.contains(&name)
            || self.any_header()
            || self.headers.iter().any(|h| h == name)
    }
}

impl Default for CorsConfig {
    /// Any origin, any header, and `GET`, `POST`, `OPTIONS`, `DELETE`, `PUT`.
    fn default() -> Self {
        Self {
            origins: AllowedOrigins::Any,
            methods: vec![
                Method::GET,
                Method::POST,
                Method::OPTIONS,
                Method::DELETE,
                Method::PUT,
            ],
            headers: vec![WILDCARD.to_string()],
        }
    }
}

/// Builder for CORS configuration.
#[derive(Debug, Clone, Default)]
pub struct CorsBuilder {
    config: CorsConfig,
}

impl CorsBuilder {
    /// Creates a new CORS builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the allowed origins. A `*` entry allows any origin.
    #[must_use]
    pub fn allow_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.origins = AllowedOrigins::from_list(origins);
        self
    }

    /// Sets the allowed HTTP methods.
    #[must_use]
    pub fn allow_methods<I>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = Method>,
    {
        self.config.methods = methods.into_iter().collect();
        self
    }

    /// Sets the allowed request headers. A `*` entry allows any header.
    #[must_use]
    pub fn allow_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.headers = headers
            .into_iter()
            .map(|h| h.into().trim().to_ascii_lowercase())
            .collect();
        self
    }

    /// Builds the CORS middleware.
    #[must_use]
    pub fn build(self) -> CorsMiddleware {
        CorsMiddleware {
            config: self.config,
        }
    }
}

/// CORS middleware that answers preflights and tags allowed origins.
#[derive(Debug, Clone, Default)]
pub struct CorsMiddleware {
    config: CorsConfig,
}

impl CorsMiddleware {
    /// Creates a new CORS builder.
    #[must_use]
    pub fn builder() -> CorsBuilder {
        CorsBuilder::new()
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &CorsConfig {
        &self.config
    }

    /// Gets the origin from a request.
    fn get_origin(request: &Request) -> Option<&str> {
        request
            .headers()
            .get(headers::ORIGIN)
            .and_then(|v| v.to_str().ok())
    }

    /// Validates an `OPTIONS` request from an allowed origin.
    ///
    /// Returns the requested method and the accepted request headers, or
    /// the status to answer with.
    fn check_preflight(&self, request: &Request) -> Result<(Method, Vec<String>), StatusCode> {
        let method = request
            .headers()
            .get(headers::REQUEST_METHOD)
            .ok_or(StatusCode::BAD_REQUEST)?
            .to_str()
            .ok()
            .and_then(|m| m.trim().parse::<Method>().ok())
            .ok_or(StatusCode::METHOD_NOT_ALLOWED)?;
        if !self.config.methods.contains(&method) {
            return Err(StatusCode::METHOD_NOT_ALLOWED);
        }

        let mut accepted = Vec::new();
        for value in request.headers().get_all(headers::REQUEST_HEADERS) {
            let Ok(list) = value.to_str() else {
                return Err(StatusCode::FORBIDDEN);
            };
            for name in list.split(',').map(str::trim).filter(|n| !n.is_empty()) {
                if !self.config.header_allowed(&name.to_ascii_lowercase()) {
                    return Err(StatusCode::FORBIDDEN);
                }
                accepted.push(name.to_string());
            }
        }

        Ok((method, accepted))
    }

    fn add_origin_headers(&self, w: &mut dyn ResponseWriter, origin: &str) {
        let response_headers = w.headers_mut();
        if let Some(value) = self.config.origins.header_value(origin) {
            response_headers.insert(headers::ALLOW_ORIGIN, value);
        }
        if self.config.origins.varies() {
            response_headers.append(headers::VARY, HeaderValue::from_static("Origin"));
        }
    }
}

impl Middleware for CorsMiddleware {
    fn name(&self) -> &'static str {
        "cors"
    }

    fn process<'a>(
        &'a self,
        w: &'a mut dyn ResponseWriter,
        request: &'a mut Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let Some(origin) = Self::get_origin(request).map(str::to_owned) else {
                next.run(w, request).await;
                return;
            };

            if !self.config.origins.is_allowed(&origin) {
                if request.method() == Method::OPTIONS {
                    tracing::debug!(origin = %origin, "OPTIONS from disallowed origin");
                    w.write_header(StatusCode::OK);
                } else {
                    next.run(w, request).await;
                }
                return;
            }

            if request.method() == Method::OPTIONS {
                let (method, accepted) = match self.check_preflight(request) {
                    Ok(checked) => checked,
                    Err(status) => {
                        tracing::debug!(origin = %origin, status = status.as_u16(), "preflight rejected");
                        w.write_header(status);
                        return;
                    }
                };

                let response_headers = w.headers_mut();
                if let Ok(value) = HeaderValue::from_str(method.as_str()) {
                    response_headers.insert(headers::ALLOW_METHODS, value);
                }
                if !accepted.is_empty() {
                    if let Ok(value) = HeaderValue::from_str(&accepted.join(",")) {
                        response_headers.insert(headers::ALLOW_HEADERS, value);
                    }
                }
                self.add_origin_headers(w, &origin);
                w.write_header(StatusCode::OK);
                return;
            }

            self.add_origin_headers(w, &origin);
            next.run(w, request).await;
        })
    }
}
