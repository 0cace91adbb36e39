//! # Log Collector Server
//!
//! HTTP server, routing and lifecycle for the log collector REST layer.
//!
//! - [`RestServer`] - start/shutdown state machine around a Hyper listener
//! - [`Route`] / [`Router`] - route definitions and the dispatch table
//! - [`BaseWrapper`] - turns a business handler result into a response
//! - [`ServerConfig`] - address, keep-alive, request logging, CORS lists
//!
//! ## Example
//!
//! ```rust,no_run
//! use logcollector_core::{handler_fn, Reply};
//! use logcollector_server::{RestServer, Route, ServerConfig};
//! use http::Method;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = RestServer::new(ServerConfig::default());
//!     server.add_routes([Route::new("Ping", Method::GET, "/ping")
//!         .handler(handler_fn(|_h, _r| Box::pin(async { Ok(Reply::body("pong")) })))]);
//!
//!     server.start(None)?;
//!     logcollector_server::wait_for_os_signal().await?;
//!     server.shutdown().await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/logcollector-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod route;
mod router;
mod server;
mod shutdown;
mod wrapper;

pub use config::{ServerConfig, ServerConfigBuilder, DEFAULT_HTTP_ADDR};
pub use route::Route;
pub use router::{PathParams, Router};
pub use server::{dispatch, RestServer, ServerError, SHUTDOWN_TIMEOUT};
pub use shutdown::{wait_for_os_signal, ShutdownSignal};
pub use wrapper::BaseWrapper;
