//! Server configuration types.
//!
//! This module provides configuration types for the REST server,
//! using the builder pattern for ergonomic construction.
//!
//! # Example
//!
//! ```rust
//! use logcollector_server::ServerConfig;
//!
//! let config = ServerConfig::builder()
//!     .http_addr("0.0.0.0:8000")
//!     .request_logging(true)
//!     .build();
//!
//! assert_eq!(config.http_addr(), "0.0.0.0:8000");
//! assert!(!config.keep_alive());
//! ```

use http::Method;
use std::net::SocketAddr;

/// Default HTTP bind address.
pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8000";

/// Server configuration.
///
/// Use [`ServerConfig::builder()`] to construct instances.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP server bind address (e.g., "0.0.0.0:8000")
    http_addr: String,

    /// Whether connections are kept open between requests
    keep_alive: bool,

    /// Whether every route logs its requests at debug level
    request_logging: bool,

    /// CORS allowed request headers
    allowed_headers: Vec<String>,

    /// CORS allowed origins
    allowed_origins: Vec<String>,

    /// CORS allowed methods
    allowed_methods: Vec<Method>,
}

impl ServerConfig {
    /// Creates a new server configuration builder.
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Returns the HTTP bind address.
    #[must_use]
    pub fn http_addr(&self) -> &str {
        &self.http_addr
    }

    /// Parses and returns the HTTP address as a `SocketAddr`.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be parsed.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.http_addr.parse()
    }

    /// Returns whether HTTP keep-alive is enabled.
    #[must_use]
    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// Returns whether debug request logging is installed on routes.
    #[must_use]
    pub fn request_logging(&self) -> bool {
        self.request_logging
    }

    /// Returns the CORS allowed request headers.
    #[must_use]
    pub fn allowed_headers(&self) -> &[String] {
        &self.allowed_headers
    }

    /// Returns the CORS allowed origins.
    #[must_use]
    pub fn allowed_origins(&self) -> &[String] {
        &self.allowed_origins
    }

    /// Returns the CORS allowed methods.
    #[must_use]
    pub fn allowed_methods(&self) -> &[Method] {
        &self.allowed_methods
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug, Clone)]
pub struct ServerConfigBuilder {
    http_addr: String,
    keep_alive: bool,
    request_logging: bool,
    allowed_headers: Vec<String>,
    allowed_origins: Vec<String>,
    allowed_methods: Vec<Method>,
}

impl ServerConfigBuilder {
    /// Creates a new builder with default values.
    ///
    /// Keep-alive is off; CORS allows every header and origin and the
    /// methods `GET`, `POST`, `OPTIONS`, `DELETE` and `PUT`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            keep_alive: false,
            request_logging: false,
            allowed_headers: vec!["*".to_string()],
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec![
                Method::GET,
                Method::POST,
                Method::OPTIONS,
                Method::DELETE,
                Method::PUT,
            ],
        }
    }

    /// Sets the HTTP bind address.
    ///
    /// # Example
    ///
    /// ```rust
    /// use logcollector_server::ServerConfigBuilder;
    ///
    /// let config = ServerConfigBuilder::new()
    ///     .http_addr("127.0.0.1:0")
    ///     .build();
    /// assert_eq!(config.socket_addr().unwrap().port(), 0);
    /// ```
    #[must_use]
    pub fn http_addr(mut self, addr: impl Into<String>) -> Self {
        self.http_addr = addr.into();
        self
    }

    /// Enables or disables HTTP keep-alive.
    #[must_use]
    pub fn keep_alive(mut self, enabled: bool) -> Self {
        self.keep_alive = enabled;
        self
    }

    /// Enables or disables debug request logging on every route.
    ///
    /// Evaluated when routes are added, not per request.
    #[must_use]
    pub fn request_logging(mut self, enabled: bool) -> Self {
        self.request_logging = enabled;
        self
    }

    /// Sets the CORS allowed request headers. `*` allows any header.
    #[must_use]
    pub fn allowed_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_headers = headers.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the CORS allowed origins. `*` allows any origin.
    #[must_use]
    pub fn allowed_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_origins = origins.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the CORS allowed methods.
    #[must_use]
    pub fn allowed_methods<I>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = Method>,
    {
        self.allowed_methods = methods.into_iter().collect();
        self
    }

    /// Builds the [`ServerConfig`] with the configured values.
    #[must_use]
    pub fn build(self) -> ServerConfig {
        ServerConfig {
            http_addr: self.http_addr,
            keep_alive: self.keep_alive,
            request_logging: self.request_logging,
            allowed_headers: self.allowed_headers,
            allowed_origins: self.allowed_origins,
            allowed_methods: self.allowed_methods,
        }
    }
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
