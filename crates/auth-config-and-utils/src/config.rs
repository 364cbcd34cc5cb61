//! Configuration management for authctl.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Default GraphQL endpoint.
pub const DEFAULT_GRAPHQL_URL: &str = "http://localhost:4000/graphql";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Credential-issuing operations that must never trigger a token refresh.
pub const DEFAULT_EXEMPT_OPERATIONS: &[&str] = &["Login", "Register", "RefreshToken"];

/// Message fragments that mark a GraphQL error as an authentication failure.
pub const DEFAULT_AUTH_FAILURE_KEYWORDS: &[&str] = &["unauthorized", "token", "logged in"];

/// Route a forced logout navigates to.
pub const DEFAULT_ENTRY_ROUTE: &str = "/";

/// Routes on which a forced logout does not navigate.
pub const DEFAULT_PUBLIC_ROUTES: &[&str] = &["/", "/register"];

const ENV_LOG_LEVEL: &str = "AUTHCTL_LOG_LEVEL";
const ENV_GRAPHQL_URL: &str = "AUTHCTL_GRAPHQL_URL";

/// Main configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// GraphQL endpoint URL.
    #[serde(default = "default_graphql_url")]
    pub graphql_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Operation names that are never refresh-eligible.
    #[serde(default = "default_exempt_operations")]
    pub exempt_operations: Vec<String>,
    /// Case-insensitive message fragments that classify an error as
    /// unauthenticated.
    #[serde(default = "default_auth_failure_keywords")]
    pub auth_failure_keywords: Vec<String>,
    /// Where a forced logout navigates to.
    #[serde(default = "default_entry_route")]
    pub entry_route: String,
    /// Routes on which a forced logout stays put.
    #[serde(default = "default_public_routes")]
    pub public_routes: Vec<String>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_graphql_url() -> String {
    DEFAULT_GRAPHQL_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_exempt_operations() -> Vec<String> {
    to_owned_list(DEFAULT_EXEMPT_OPERATIONS)
}

fn default_auth_failure_keywords() -> Vec<String> {
    to_owned_list(DEFAULT_AUTH_FAILURE_KEYWORDS)
}

fn default_entry_route() -> String {
    DEFAULT_ENTRY_ROUTE.to_string()
}

fn default_public_routes() -> Vec<String> {
    to_owned_list(DEFAULT_PUBLIC_ROUTES)
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            graphql_url: default_graphql_url(),
            request_timeout_secs: default_request_timeout_secs(),
            exempt_operations: default_exempt_operations(),
            auth_failure_keywords: default_auth_failure_keywords(),
            entry_route: default_entry_route(),
            public_routes: default_public_routes(),
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from `<base>/config.json`, falling back to defaults,
    /// then apply environment overrides and validate.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Override configuration from environment variables.
    fn load_from_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from a variable lookup. Blank values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(log_level) = non_empty(ENV_LOG_LEVEL) {
            self.log_level = log_level;
        }
        if let Some(url) = non_empty(ENV_GRAPHQL_URL) {
            self.graphql_url = url;
        }
    }

    /// Check invariants the pipeline relies on.
    pub fn validate(&self) -> CoreResult<()> {
        self.graphql_url()?;

        if self.request_timeout_secs == 0 {
            return Err(CoreError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if !self.entry_route.starts_with('/') {
            return Err(CoreError::Config(format!(
                "entry_route must be an absolute path, got {:?}",
                self.entry_route
            )));
        }
        if self.auth_failure_keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(CoreError::Config(
                "auth_failure_keywords must not contain blank entries".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the GraphQL endpoint as a parsed URL.
    pub fn graphql_url(&self) -> CoreResult<Url> {
        Url::parse(&self.graphql_url).map_err(CoreError::from)
    }
}
