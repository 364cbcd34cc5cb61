//! CLI command implementations.

mod auth;
mod query;

pub use auth::{login, logout, register, status, whoami};
pub use query::{query, QueryRequest};

use crate::navigator::TerminalNavigator;
use anyhow::Result;
use auth_config_and_utils::{Config, Paths};
use auth_pipeline::{AuthPipeline, ForcedLogout, PipelinePolicy};
use credential_storage::create_file_store;
use gql_transport::HttpTransport;
use session_client::SessionClient;
use std::sync::Arc;
use std::time::Duration;

/// Everything a command needs.
pub struct Context {
    pub paths: Paths,
    pub graphql_url: String,
    pub client: SessionClient,
}

impl Context {
    /// Wire the file-backed store, HTTP transport and pipeline together.
    pub fn new(paths: Paths, config: &Config) -> Result<Self> {
        let store = Arc::new(create_file_store(paths.credentials_file()));
        let transport = HttpTransport::new(
            config.graphql_url()?,
            Duration::from_secs(config.request_timeout_secs),
        )?;

        let pipeline = AuthPipeline::new(store, Arc::new(transport))
            .with_policy(PipelinePolicy::from_config(config))
            .with_forced_logout(ForcedLogout::from_config(
                Box::new(TerminalNavigator::new()),
                config,
            ));

        Ok(Self {
            paths,
            graphql_url: config.graphql_url.clone(),
            client: SessionClient::new(Arc::new(pipeline)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_context_starts_signed_out() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let ctx = Context::new(paths, &Config::default()).unwrap();

        assert!(!ctx.client.session().is_authenticated);
        assert_eq!(ctx.graphql_url, "http://localhost:4000/graphql");
    }

    #[test]
    fn test_context_sees_stored_credentials() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());
        create_file_store(paths.credentials_file())
            .set_pair(&credential_storage::CredentialPair::new("a", "r"));

        let ctx = Context::new(paths, &Config::default()).unwrap();

        assert!(ctx.client.session().is_authenticated);
    }
}
