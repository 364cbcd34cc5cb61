//! Logging initialization.
//!
//! Thin wrapper over the observability crate so binaries only pass a level.

use observability::LogConfig;
use std::path::PathBuf;

/// Initialize logging for the authctl binary.
///
/// `RUST_LOG` overrides `level`. `log_path` selects the JSONL file when the
/// observability `dev` sink is compiled in.
pub fn init_logging(level: &str, log_path: Option<PathBuf>, also_stderr: bool) {
    observability::init_with_config(LogConfig {
        service_name: "authctl".into(),
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
