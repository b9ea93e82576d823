//! Logging initialization for the client.
//!
//! Thin wrapper over the observability crate: structured JSONL to
//! `~/.moviemeetup/logs/client.jsonl` and, for interactive runs, stderr.

use observability::LogConfig;
use std::path::PathBuf;

/// Initialize the logging system.
///
/// # Arguments
///
/// * `level` - Default log level (trace, debug, info, warn, error); `RUST_LOG` wins when set
/// * `log_path` - JSONL destination, `None` for the default location
/// * `also_stderr` - Mirror log lines to stderr
///
/// # Example
///
/// ```ignore
/// init_logging("info", None, false);
/// tracing::info!("client started");
/// ```
pub fn init_logging(level: &str, log_path: Option<PathBuf>, also_stderr: bool) {
    observability::init_with_config(LogConfig {
        service_name: "moviemeetup-cli".into(),
        default_level: parse_level(level).to_string().to_lowercase(),
        log_path,
        also_stderr,
    });
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
