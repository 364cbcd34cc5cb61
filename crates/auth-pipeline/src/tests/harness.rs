//! Test harness for pipeline scenarios.
//!
//! Provides:
//! - FakeServer: issues and checks credentials like a real auth server
//! - RecordingNavigator: remembers every forced navigation
//! - TestHarness: a pipeline wired to both, seeded with `a-1` / `r-1`

use crate::{AuthPipeline, ForcedLogout, Navigator};
use credential_storage::{create_memory_store, CredentialPair, CredentialStore};
use gql_transport::mock::ScriptedTransport;
use gql_transport::{GraphQlError, Operation, Outcome};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct ServerState {
    access: String,
    refresh: String,
    generation: u32,
    reject_refresh: bool,
    reject_everything: bool,
    offline: bool,
}

/// Accepts exactly one access token at a time and rotates the pair on
/// every successful refresh.
pub struct FakeServer {
    state: Mutex<ServerState>,
}

impl FakeServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(ServerState {
                access: "a-1".to_string(),
                refresh: "r-1".to_string(),
                generation: 1,
                reject_refresh: false,
                reject_everything: false,
                offline: false,
            }),
        })
    }

    /// The client's access token stops being accepted.
    pub fn expire_access(&self) {
        self.state.lock().access.clear();
    }

    pub fn reject_refresh(&self) {
        self.state.lock().reject_refresh = true;
    }

    /// Every protected call is rejected, even with fresh credentials.
    pub fn reject_everything(&self) {
        self.state.lock().reject_everything = true;
    }

    pub fn go_offline(&self) {
        self.state.lock().offline = true;
    }

    pub fn handle(&self, op: &Operation) -> Outcome {
        let mut state = self.state.lock();
        if state.offline {
            return Outcome::network_failure("connection refused");
        }

        match op.name.as_str() {
            "RefreshToken" => {
                let presented = op.variables.get("refreshToken").and_then(|v| v.as_str());
                if state.reject_refresh || presented != Some(state.refresh.as_str()) {
                    return Outcome::errors(vec![GraphQlError::unauthenticated(
                        "Invalid refresh token",
                    )]);
                }
                state.generation += 1;
                state.access = format!("a-{}", state.generation);
                state.refresh = format!("r-{}", state.generation);
                Outcome::success(json!({
                    "refreshToken": {
                        "accessToken": state.access,
                        "refreshToken": state.refresh,
                    }
                }))
            }
            "Login" => Outcome::errors(vec![GraphQlError::unauthenticated("Invalid credentials")]),
            name => {
                let accepted = !state.reject_everything
                    && !state.access.is_empty()
                    && op.bearer_token() == Some(state.access.as_str());
                if accepted {
                    Outcome::success(json!({ "operation": name, "token": state.access }))
                } else {
                    Outcome::errors(vec![GraphQlError::new("Token expired")
                        .with_code("UNAUTHENTICATED")
                        .with_path(vec![gql_transport::PathSegment::Key(name.to_string())])])
                }
            }
        }
    }
}

/// Navigator that records every forced navigation.
#[derive(Clone)]
pub struct RecordingNavigator {
    path: Arc<Mutex<String>>,
    visits: Arc<Mutex<Vec<String>>>,
}

impl RecordingNavigator {
    pub fn at(path: &str) -> Self {
        Self {
            path: Arc::new(Mutex::new(path.to_string())),
            visits: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn current_path(&self) -> String {
        self.path.lock().clone()
    }

    fn navigate(&self, path: &str) {
        *self.path.lock() = path.to_string();
        self.visits.lock().push(path.to_string());
    }
}

pub struct TestHarness {
    pub server: Arc<FakeServer>,
    pub transport: Arc<ScriptedTransport>,
    pub store: Arc<CredentialStore>,
    pub navigator: RecordingNavigator,
    pub pipeline: Arc<AuthPipeline>,
    pub expirations: Arc<AtomicUsize>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::build("/dashboard", &[])
    }

    /// Harness whose transport delays the named operations.
    pub fn with_latency(latency: &[(&str, Duration)]) -> Self {
        Self::build("/dashboard", latency)
    }

    pub fn build(current_path: &str, latency: &[(&str, Duration)]) -> Self {
        let server = FakeServer::new();
        let handler_server = server.clone();
        let mut transport = ScriptedTransport::new(move |op| handler_server.handle(op));
        for (name, delay) in latency {
            transport = transport.with_latency(*name, *delay);
        }
        let transport = Arc::new(transport);

        let store = Arc::new(create_memory_store());
        store.set_pair(&CredentialPair::new("a-1", "r-1"));

        let navigator = RecordingNavigator::at(current_path);
        let pipeline = AuthPipeline::new(store.clone(), transport.clone())
            .with_forced_logout(ForcedLogout::with_defaults(Box::new(navigator.clone())));
        let pipeline = Arc::new(pipeline);

        let expirations = Arc::new(AtomicUsize::new(0));
        let counter = expirations.clone();
        pipeline.on_session_expired(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        Self {
            server,
            transport,
            store,
            navigator,
            pipeline,
            expirations,
        }
    }

    pub fn expirations(&self) -> usize {
        self.expirations.load(Ordering::SeqCst)
    }
}

/// A protected query that always goes to the network.
pub fn protected_query(name: &str) -> Operation {
    Operation::query(name, format!("query {} {{ value }}", name))
        .with_fetch_policy(gql_transport::FetchPolicy::NetworkOnly)
}
