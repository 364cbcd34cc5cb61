//! Forced-logout navigation.

use auth_config_and_utils::{Config, DEFAULT_ENTRY_ROUTE, DEFAULT_PUBLIC_ROUTES};
use tracing::info;

/// Where the user currently is, and how to send them elsewhere.
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;
    fn navigate(&self, path: &str);
}

/// Sends the user to the entry route after their session ends.
pub struct ForcedLogout {
    navigator: Box<dyn Navigator>,
    entry_route: String,
    public_routes: Vec<String>,
}

impl ForcedLogout {
    pub fn new(
        navigator: Box<dyn Navigator>,
        entry_route: impl Into<String>,
        public_routes: Vec<String>,
    ) -> Self {
        Self {
            navigator,
            entry_route: entry_route.into(),
            public_routes,
        }
    }

    pub fn with_defaults(navigator: Box<dyn Navigator>) -> Self {
        Self::new(
            navigator,
            DEFAULT_ENTRY_ROUTE,
            DEFAULT_PUBLIC_ROUTES.iter().map(|r| r.to_string()).collect(),
        )
    }

    pub fn from_config(navigator: Box<dyn Navigator>, config: &Config) -> Self {
        Self::new(navigator, &config.entry_route, config.public_routes.clone())
    }

    /// Navigate to the entry route unless already on a public route.
    /// Returns whether navigation happened.
    pub fn trigger(&self) -> bool {
        let current = self.navigator.current_path();
        if self.public_routes.iter().any(|route| *route == current) {
            info!(path = %current, "Session ended on a public route, staying");
            return false;
        }

        info!(from = %current, to = %self.entry_route, "Session ended, navigating to entry route");
        self.navigator.navigate(&self.entry_route);
        true
    }
}
