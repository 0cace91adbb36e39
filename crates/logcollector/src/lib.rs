//! # Log Collector
//!
//! An HTTP service with a single endpoint, `POST /v1/log`, that accepts a
//! JSON log message (`{"message": "..."}`) and writes it to the process log.
//!
//! The REST plumbing (routing, middleware, CORS, lifecycle) lives in
//! `logcollector-server`; this crate holds the business handler, its
//! payload model and the command-line configuration.
//!
//! # Example Usage
//!
//! ```bash
//! $ logcollector --port 8000 -l debug --log /var/log/collector.log
//! $ curl -X POST localhost:8000/v1/log -d '{"message":"hello"}'
//! ```

#![doc(html_root_url = "https://docs.rs/logcollector/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod handlers;
pub mod model;

pub use config::Args;
pub use handlers::{log_routes, LogPost, LOG_PATH};
pub use model::LogMessage;

/// Name used in lifecycle log records.
pub const SERVER_NAME: &str = "Http Log Collector";

/// Collector version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
