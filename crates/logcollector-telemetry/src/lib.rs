//! Logging setup for the log collector.
//!
//! The collector logs through `tracing`. This crate installs the process
//! subscriber from a [`LogConfig`]: a filter level, an optional append-only
//! log file (stderr otherwise) and JSON or text output. Records are written
//! off the calling thread through `tracing-appender`.
//!
//! # Example
//!
//! ```rust,no_run
//! use logcollector_telemetry::{init_logging, LogConfig};
//!
//! fn main() -> Result<(), logcollector_telemetry::TelemetryError> {
//!     let config = LogConfig {
//!         level: "debug".to_string(),
//!         json_format: false,
//!         ..LogConfig::default()
//!     };
//!     let _guard = init_logging(&config)?;
//!
//!     tracing::debug!(log = "hello", "message received");
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{build_subscriber, create_env_filter, init_logging, LogConfig, LoggingGuard};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
