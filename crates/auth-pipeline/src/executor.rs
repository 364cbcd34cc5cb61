//! Refresh executor.
//!
//! The refresh call goes straight to the transport. It must never pass
//! through the auth pipeline, otherwise a rejected refresh would try to
//! refresh itself.

use crate::RefreshError;
use credential_storage::CredentialPair;
use gql_transport::{Operation, Outcome, Transport};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

pub const REFRESH_OPERATION: &str = "RefreshToken";

pub const REFRESH_DOCUMENT: &str = r#"mutation RefreshToken($refreshToken: String!) {
  refreshToken(input: { refreshToken: $refreshToken }) {
    accessToken
    refreshToken
  }
}"#;

/// A transport handle with no middleware in front of it.
#[derive(Clone)]
pub struct BareTransport(Arc<dyn Transport>);

impl BareTransport {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self(transport)
    }

    pub async fn execute(&self, operation: &Operation) -> Outcome {
        self.0.execute(operation).await
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshData {
    refresh_token: Option<RefreshPayload>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshPayload {
    access_token: String,
    refresh_token: String,
}

/// Exchanges a refresh credential for a new pair.
#[derive(Clone)]
pub struct RefreshExecutor {
    transport: BareTransport,
}

impl RefreshExecutor {
    pub fn new(transport: BareTransport) -> Self {
        Self { transport }
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<CredentialPair, RefreshError> {
        let operation = Operation::mutation(REFRESH_OPERATION, REFRESH_DOCUMENT)
            .with_variable("refreshToken", refresh_token);
        debug!(request_id = %operation.id, "Requesting new credentials");

        let outcome = self.transport.execute(&operation).await;

        if let Some(reason) = outcome.network_failure {
            return Err(RefreshError::Network(reason));
        }
        if let Some(error) = outcome.errors.into_iter().next() {
            return Err(RefreshError::Rejected(error.message));
        }

        let data = outcome
            .data
            .ok_or_else(|| RefreshError::Malformed("no data".to_string()))?;
        let payload = serde_json::from_value::<RefreshData>(data)
            .map_err(|e| RefreshError::Malformed(e.to_string()))?
            .refresh_token
            .ok_or_else(|| RefreshError::Malformed("refreshToken is null".to_string()))?;

        if payload.access_token.is_empty() || payload.refresh_token.is_empty() {
            return Err(RefreshError::Malformed("empty credential".to_string()));
        }

        Ok(CredentialPair::new(payload.access_token, payload.refresh_token))
    }
}
