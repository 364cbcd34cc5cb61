//! The composed request pipeline.

use crate::auth_link::authorize;
use crate::classify::{classify, Verdict};
use crate::{
    BareTransport, ForcedLogout, PipelinePolicy, PipelineResult, RefreshExecutor,
    Recovery, RefreshOrchestrator, ResponseCache,
};
use credential_storage::CredentialStore;
use gql_transport::{Operation, Transport};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Callback run when a failed refresh ends the session.
pub type ExpiryListener = Arc<dyn Fn() + Send + Sync>;

/// Authenticated GraphQL client.
///
/// Every operation passes through: cache lookup, bearer header injection,
/// transport, classification, and at most one refresh-and-retry.
pub struct AuthPipeline {
    store: Arc<CredentialStore>,
    transport: Arc<dyn Transport>,
    policy: PipelinePolicy,
    orchestrator: RefreshOrchestrator,
    cache: ResponseCache,
    forced_logout: Option<ForcedLogout>,
    expiry_listeners: Mutex<Vec<ExpiryListener>>,
}

impl AuthPipeline {
    pub fn new(store: Arc<CredentialStore>, transport: Arc<dyn Transport>) -> Self {
        let executor = RefreshExecutor::new(BareTransport::new(transport.clone()));
        Self {
            orchestrator: RefreshOrchestrator::new(store.clone(), executor),
            store,
            transport,
            policy: PipelinePolicy::default(),
            cache: ResponseCache::new(),
            forced_logout: None,
            expiry_listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn with_policy(mut self, policy: PipelinePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_forced_logout(mut self, forced_logout: ForcedLogout) -> Self {
        self.forced_logout = Some(forced_logout);
        self
    }

    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    pub fn policy(&self) -> &PipelinePolicy {
        &self.policy
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn orchestrator(&self) -> &RefreshOrchestrator {
        &self.orchestrator
    }

    /// Register a callback for sessions ended by a failed refresh.
    pub fn on_session_expired(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.expiry_listeners.lock().push(Arc::new(listener));
    }

    pub fn invalidate_cache(&self) {
        self.cache.invalidate();
    }

    /// Execute an operation and return its `data`.
    pub async fn execute(&self, operation: Operation) -> PipelineResult<Value> {
        if let Some(data) = self.cache.lookup(&operation) {
            return Ok(data);
        }

        let mut operation = operation;
        loop {
            let sent_token = authorize(&self.store, &self.policy, &mut operation);
            debug!(
                operation = %operation.name,
                request_id = %operation.id,
                retry = operation.retry_marked,
                authenticated = sent_token.is_some(),
                "Dispatching operation"
            );

            let outcome = self.transport.execute(&operation).await;

            match classify(&self.policy, &operation, outcome) {
                Verdict::Success(data) => {
                    self.cache.store(&operation, &data);
                    return Ok(data);
                }
                Verdict::Fail(e) => return Err(e),
                Verdict::RefreshEligible(rejection) => {
                    info!(
                        operation = %operation.name,
                        request_id = %operation.id,
                        "Credentials rejected, refreshing"
                    );
                    let recovery = self
                        .orchestrator
                        .recover(sent_token.as_deref(), || self.expire_session())
                        .await?;
                    match recovery {
                        Recovery::Retry => operation = operation.retry(),
                        Recovery::Anonymous => return Err(rejection),
                    }
                }
            }
        }
    }

    /// Execute an operation and decode its `data` into `T`.
    pub async fn execute_as<T: DeserializeOwned>(&self, operation: Operation) -> PipelineResult<T> {
        let data = self.execute(operation).await?;
        Ok(serde_json::from_value(data)?)
    }

    fn expire_session(&self) {
        self.cache.invalidate();

        // Listeners run without the lock so they may register others.
        let listeners = self.expiry_listeners.lock().clone();
        for listener in listeners {
            listener();
        }

        if let Some(forced_logout) = &self.forced_logout {
            forced_logout.trigger();
        }
    }
}
