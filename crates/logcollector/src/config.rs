//! Command-line configuration.
//!
//! Every flag can also be supplied through an environment variable.

use std::path::PathBuf;

use clap::Parser;
use logcollector_server::ServerConfig;
use logcollector_telemetry::LogConfig;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8000;

/// Log collector command-line arguments.
#[derive(Debug, Clone, Parser)]
#[command(name = "logcollector", version, about = "HTTP log collector")]
pub struct Args {
    /// REST listening port.
    #[arg(long, env = "LOGCOLLECTOR_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Log output file path (stderr when unset).
    #[arg(long = "log", env = "LOGCOLLECTOR_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level.
    #[arg(short = 'l', long = "level", env = "LOGCOLLECTOR_LOG_LEVEL", default_value = "info")]
    pub level: String,

    /// Emit human-readable log lines instead of JSON.
    #[arg(long, conflicts_with = "json_logs")]
    pub pretty_logs: bool,

    /// Emit JSON log lines (the default).
    #[arg(long)]
    pub json_logs: bool,
}

impl Args {
    /// Logging setup described by the flags.
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            level: self.level.clone(),
            file: self.log_file.clone(),
            json_format: !self.pretty_logs,
            ..LogConfig::default()
        }
    }

    /// Server setup described by the flags.
    ///
    /// Request logging follows the log level: it is only enabled when debug
    /// records would be emitted.
    #[must_use]
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig::builder()
            .http_addr(format!("0.0.0.0:{}", self.port))
            .request_logging(self.log_config().is_debug())
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("logcollector").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.port, DEFAULT_PORT);
        assert_eq!(args.level, "info");
        assert!(args.log_file.is_none());

        let log = args.log_config();
        assert!(log.json_format);
        assert!(!log.is_debug());

        let server = args.server_config();
        assert_eq!(server.http_addr(), "0.0.0.0:8000");
        assert!(!server.request_logging());
        assert!(!server.keep_alive());
    }

    #[test]
    fn test_flags() {
        let args = parse(&["--port", "9001", "--log", "/tmp/collector.log", "-l", "debug", "--pretty-logs"]);

        assert_eq!(args.server_config().http_addr(), "0.0.0.0:9001");
        assert!(args.server_config().request_logging());

        let log = args.log_config();
        assert_eq!(log.file, Some(PathBuf::from("/tmp/collector.log")));
        assert!(!log.json_format);
    }

    #[test]
    fn test_invalid_port_rejected() {
        let result = Args::try_parse_from(["logcollector", "--port", "http"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_format_flags_conflict() {
        let result = Args::try_parse_from(["logcollector", "--json-logs", "--pretty-logs"]);
        assert!(result.is_err());
    }
}
