//! Core configuration, paths, and logging setup for authctl.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, DEFAULT_AUTH_FAILURE_KEYWORDS, DEFAULT_ENTRY_ROUTE, DEFAULT_EXEMPT_OPERATIONS,
    DEFAULT_GRAPHQL_URL, DEFAULT_LOG_LEVEL, DEFAULT_PUBLIC_ROUTES, DEFAULT_REQUEST_TIMEOUT_SECS,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
