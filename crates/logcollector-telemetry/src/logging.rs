//! Structured logging setup for the log collector.
//!
//! One global `tracing` subscriber is installed per process. Records go to
//! stderr, or are appended to a file when one is configured, either as
//! JSON lines or as human-readable text. Writes happen on a background
//! thread; the returned [`LoggingGuard`] flushes it when dropped.
//!
//! # Example
//!
//! ```rust,ignore
//! use logcollector_telemetry::{init_logging, LogConfig};
//!
//! let config = LogConfig {
//!     level: "debug".to_string(),
//!     ..LogConfig::default()
//! };
//! let _guard = init_logging(&config)?;
//!
//! tracing::info!(port = 8000, "collector starting");
//! ```

use std::fs::OpenOptions;
use std::path::PathBuf;

use tracing::{Level, Subscriber};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter directive, usually a bare level ("info", "debug").
    pub level: String,

    /// File to append records to. `None` logs to stderr.
    pub file: Option<PathBuf>,

    /// Whether to output JSON lines.
    pub json_format: bool,

    /// Whether to include the target (module path).
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            json_format: true,
            include_target: true,
        }
    }
}

impl LogConfig {
    /// Returns `true` when the configured level lets debug records through.
    ///
    /// Only bare levels are recognised; a per-target directive such as
    /// `logcollector=debug` reports `false`.
    #[must_use]
    pub fn is_debug(&self) -> bool {
        self.level
            .trim()
            .parse::<Level>()
            .map_or(false, |level| level >= Level::DEBUG)
    }
}

/// Keeps the background log writer alive.
///
/// Dropping it flushes buffered records. Hold it for the life of the
/// process.
#[must_use = "dropping the guard stops the log writer"]
pub struct LoggingGuard {
    _worker: WorkerGuard,
}

impl std::fmt::Debug for LoggingGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggingGuard").finish_non_exhaustive()
    }
}

/// Builds the subscriber described by `config` without installing it.
///
/// # Errors
///
/// Returns `TelemetryError::LoggingInit` for an unparsable level and
/// `TelemetryError::Io` when the log file cannot be opened.
pub fn build_subscriber(
    config: &LogConfig,
) -> TelemetryResult<(Box<dyn Subscriber + Send + Sync>, LoggingGuard)> {
    let filter = create_env_filter(&config.level)?;
    let (writer, guard, ansi) = make_writer(config)?;

    let subscriber: Box<dyn Subscriber + Send + Sync> = if config.json_format {
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(config.include_target)
            .with_filter(filter);
        Box::new(tracing_subscriber::registry().with(layer))
    } else {
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(config.include_target)
            .with_filter(filter);
        Box::new(tracing_subscriber::registry().with(layer))
    };

    Ok((subscriber, LoggingGuard { _worker: guard }))
}

/// Initializes the logging subsystem.
///
/// # Errors
///
/// Returns `TelemetryError::LoggingInit` if the configuration is invalid or
/// a global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<LoggingGuard> {
    let (subscriber, guard) = build_subscriber(config)?;
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    Ok(guard)
}

/// Creates an env filter from a string.
///
/// # Errors
///
/// Returns error if the filter string is invalid.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter)
        .map_err(|e| TelemetryError::LoggingInit(format!("invalid log level {filter:?}: {e}")))
}

/// Picks the record sink. ANSI colours are only used on stderr.
fn make_writer(config: &LogConfig) -> TelemetryResult<(NonBlocking, WorkerGuard, bool)> {
    match &config.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            Ok((writer, guard, false))
        }
        None => {
            let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
            Ok((writer, guard, true))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn file_config(path: PathBuf, json_format: bool) -> LogConfig {
        LogConfig {
            level: "debug".to_string(),
            file: Some(path),
            json_format,
            include_target: false,
        }
    }

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert!(config.json_format);
        assert!(config.file.is_none());
        assert_eq!(config.level, "info");
        assert!(!config.is_debug());
    }

    #[test]
    fn test_is_debug() {
        let level = |l: &str| LogConfig {
            level: l.to_string(),
            ..LogConfig::default()
        };

        assert!(level("debug").is_debug());
        assert!(level("TRACE").is_debug());
        assert!(!level("warn").is_debug());
        assert!(!level("logcollector=debug").is_debug());
    }

    #[test]
    fn test_create_env_filter() {
        assert!(create_env_filter("info").is_ok());
        assert!(matches!(
            create_env_filter("info,collector=loud"),
            Err(TelemetryError::LoggingInit(_))
        ));
    }

    #[test]
    fn test_json_records_appended_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collector.log");
        fs::write(&path, "existing line\n").unwrap();

        let (subscriber, guard) = build_subscriber(&file_config(path.clone(), true)).unwrap();
        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!(status = 200, "request served");
            tracing::trace!("filtered out");
        });
        drop(guard);

        let contents = fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some("existing line"));

        let record: serde_json::Value = serde_json::from_str(lines.next().unwrap()).unwrap();
        assert_eq!(record["level"], "DEBUG");
        assert_eq!(record["fields"]["message"], "request served");
        assert_eq!(record["fields"]["status"], 200);
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_text_records_have_no_ansi_in_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collector.log");

        let (subscriber, guard) = build_subscriber(&file_config(path.clone(), false)).unwrap();
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(log = "hello", "message received");
        });
        drop(guard);

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("message received"));
        assert!(contents.contains("hello"));
        assert!(!contents.contains('\u{1b}'));
    }

    #[test]
    fn test_unwritable_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = file_config(dir.path().join("missing").join("collector.log"), true);

        assert!(matches!(
            build_subscriber(&config),
            Err(TelemetryError::Io(_))
        ));
    }
}
