//! Pipeline policy: which operations are exempt and what counts as an
//! authentication failure.

use auth_config_and_utils::{Config, DEFAULT_AUTH_FAILURE_KEYWORDS, DEFAULT_EXEMPT_OPERATIONS};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelinePolicy {
    exempt_operations: BTreeSet<String>,
    // Lowercased.
    auth_failure_keywords: Vec<String>,
}

impl PipelinePolicy {
    pub fn new<E, K>(exempt_operations: E, auth_failure_keywords: K) -> Self
    where
        E: IntoIterator,
        E::Item: Into<String>,
        K: IntoIterator,
        K::Item: AsRef<str>,
    {
        Self {
            exempt_operations: exempt_operations.into_iter().map(Into::into).collect(),
            auth_failure_keywords: auth_failure_keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.exempt_operations.iter().cloned(),
            &config.auth_failure_keywords,
        )
    }

    /// Credential-issuing operations never carry a bearer token and never
    /// trigger a refresh.
    pub fn is_exempt(&self, operation_name: &str) -> bool {
        self.exempt_operations.contains(operation_name)
    }

    /// Case-insensitive keyword match on an error message.
    pub fn message_signals_auth_failure(&self, message: &str) -> bool {
        let message = message.to_lowercase();
        self.auth_failure_keywords
            .iter()
            .any(|keyword| message.contains(keyword.as_str()))
    }
}

impl Default for PipelinePolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_EXEMPT_OPERATIONS.iter().copied(),
            DEFAULT_AUTH_FAILURE_KEYWORDS,
        )
    }
}
