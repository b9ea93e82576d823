//! # Observability
//!
//! Logging layer shared by every Movie Meetup crate.
//!
//! Library crates are **log producers** only. They use standard `tracing`
//! macros and never decide where output goes. The binary calls
//! [`init_with_config`] once at startup, which installs:
//!
//! - a JSONL file sink (`~/.moviemeetup/logs/client.jsonl` by default), one
//!   JSON object per line, append-only and flushed per line
//! - an optional compact stderr sink for interactive runs
//!
//! Credential-bearing fields (tokens, passwords, authorization headers) are
//! replaced with `"[REDACTED]"` before they reach the file.
//!
//! ## Usage
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init_with_config(observability::LogConfig {
//!         service_name: "cli".into(),
//!         default_level: "debug".into(),
//!         also_stderr: true,
//!         ..Default::default()
//!     });
//!
//!     tracing::info!("ready");
//! }
//! ```

mod file;
mod json_layer;
mod redact;

use std::path::PathBuf;

pub use file::{default_log_path, CentralLogWriter};
pub use json_layer::LogEntry;
pub use redact::{is_sensitive_key, REDACTED};

/// Logging setup for one process.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Written as `service` on every line
    pub service_name: String,
    /// Filter used when `RUST_LOG` is unset
    pub default_level: String,
    /// JSONL destination; `None` means [`default_log_path`]
    pub log_path: Option<PathBuf>,
    /// Mirror events to stderr in compact form
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "moviemeetup".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Initialize the observability layer with custom configuration.
///
/// Falls back to stderr-only output when the log file cannot be opened.
/// Calling this more than once keeps the first subscriber.
pub fn init_with_config(config: LogConfig) {
    file::init_file_subscriber(&config);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.service_name, "moviemeetup");
        assert_eq!(config.default_level, "info");
        assert!(config.log_path.is_none());
        assert!(!config.also_stderr);
    }
}
