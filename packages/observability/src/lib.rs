//! # Observability
//!
//! Logging setup shared by every authctl crate.
//!
//! Library crates never configure logging themselves. They emit events with the
//! standard `tracing` macros and leave sinks and filtering to the binary, which
//! calls [`init`] or [`init_with_config`] exactly once at startup.
//!
//! Two sinks are available:
//!
//! - a compact human-readable layer on stderr, always available;
//! - with the `dev` feature, structured JSONL appended to
//!   `~/.authctl/logs/dev.jsonl` (or [`LogConfig::log_path`]), suitable for
//!   `tail -f ... | jq`.
//!
//! `RUST_LOG` always wins over [`LogConfig::default_level`].
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init_with_config(observability::LogConfig {
//!         service_name: "authctl".into(),
//!         default_level: "debug".into(),
//!         also_stderr: true,
//!         ..Default::default()
//!     });
//!
//!     tracing::info!("ready");
//! }
//! ```

#[cfg(feature = "dev")]
mod dev;

mod json_layer;

pub use json_layer::{JsonLayer, LogEntry};

use std::path::PathBuf;

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service (e.g., "authctl").
    /// Included in every JSONL line for filtering.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG`.
    pub default_level: String,

    /// Optional custom log file path.
    /// Defaults to `~/.authctl/logs/dev.jsonl` in dev mode.
    pub log_path: Option<PathBuf>,

    /// Also emit logs to stderr.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Initialize logging with default settings for the given service.
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize logging with a custom configuration.
///
/// Calling this twice is harmless: the second global subscriber install is
/// ignored.
pub fn init_with_config(config: LogConfig) {
    #[cfg(feature = "dev")]
    {
        dev::init_dev_subscriber(&config);
    }

    #[cfg(not(feature = "dev"))]
    {
        use tracing_subscriber::util::SubscriberInitExt;

        // Without the file sink, stderr is the only place to write; when the
        // caller did not ask for it, keep warnings and errors visible anyway.
        let level = if config.also_stderr {
            config.default_level.as_str()
        } else {
            "warn"
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter(level))
            .with_target(true)
            .with_writer(std::io::stderr)
            .compact()
            .finish()
            .try_init();
    }
}

/// Build the env filter, preferring `RUST_LOG` over the configured default.
pub(crate) fn env_filter(default_level: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level))
}

/// Re-export tracing macros for convenience.
pub use tracing::{debug, error, info, instrument, trace, warn};

/// Re-export Level for advanced filtering.
pub use tracing::Level;
