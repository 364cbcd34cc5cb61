//! Single-flight credential refresh.
//!
//! ## State Diagram
//!
//! ```text
//!        Begin                Complete
//! Idle ─────────► Refreshing ─────────► Succeeded ──┐
//!  ▲                 │    │                          │
//!  │       Abandon   │    │ Reject                   │ Settle
//!  ├─────────────────┘    ▼                          │
//!  │                    Failed ──────────────────────┤
//!  └─────────────────────────────────────────────────┘
//! ```
//!
//! The first caller to find the machine `Idle` becomes the leader and runs
//! the refresh. Callers arriving while it is `Refreshing` wait for the
//! leader's result. `Succeeded` and `Failed` are only held while waiters are
//! being released, under the same lock, so other callers never observe them.

use crate::{PipelineError, PipelineResult, RefreshError, RefreshExecutor};
use credential_storage::{CredentialKind, CredentialStore};
use parking_lot::Mutex;
use rust_fsm::*;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub refresh_machine(Idle)

    Idle => {
        Begin => Refreshing
    },
    Refreshing => {
        Complete => Succeeded,
        Reject => Failed,
        // Leader dropped before finishing
        Abandon => Idle
    },
    Succeeded => {
        Settle => Idle
    },
    Failed => {
        Settle => Idle
    }
}

pub use refresh_machine::Input as RefreshMachineInput;
pub use refresh_machine::State as RefreshMachineState;
pub use refresh_machine::StateMachine as RefreshMachine;

/// How a caller should proceed after [`RefreshOrchestrator::recover`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Credentials are fresh; retry the operation once.
    Retry,
    /// No credentials were sent or stored, so there is no session to refresh.
    Anonymous,
}

/// Result broadcast by the leader to every waiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshSignal {
    Refreshed,
    Expired,
}

struct Inner {
    machine: RefreshMachine,
    waiters: Vec<oneshot::Sender<RefreshSignal>>,
}

enum Role {
    Leader,
    Waiter(oneshot::Receiver<RefreshSignal>),
}

fn transition(machine: &mut RefreshMachine, input: RefreshMachineInput) -> PipelineResult<()> {
    machine.consume(&input).map(|_| ()).map_err(|_| {
        PipelineError::InvalidStateTransition(format!(
            "Cannot apply {:?} in state {:?}",
            input,
            machine.state()
        ))
    })
}

/// Coordinates refreshes so that concurrent credential failures share one
/// refresh call.
pub struct RefreshOrchestrator {
    store: Arc<CredentialStore>,
    executor: RefreshExecutor,
    inner: Mutex<Inner>,
}

impl RefreshOrchestrator {
    pub fn new(store: Arc<CredentialStore>, executor: RefreshExecutor) -> Self {
        Self {
            store,
            executor,
            inner: Mutex::new(Inner {
                machine: RefreshMachine::new(),
                waiters: Vec::new(),
            }),
        }
    }

    pub fn state(&self) -> RefreshMachineState {
        self.inner.lock().machine.state().clone()
    }

    /// Recover from a credential failure of a call that carried `sent_token`.
    ///
    /// On refresh failure the store is cleared, `on_expired` runs exactly
    /// once for the whole flight, and every caller gets
    /// [`PipelineError::SessionExpired`]. A caller whose credentials were
    /// cleared by an earlier flight gets `SessionExpired` without side
    /// effects. A caller that never had credentials gets
    /// [`Recovery::Anonymous`], also without side effects.
    pub async fn recover<F>(&self, sent_token: Option<&str>, on_expired: F) -> PipelineResult<Recovery>
    where
        F: FnOnce(),
    {
        loop {
            let role = {
                let mut inner = self.inner.lock();
                let state = inner.machine.state().clone();
                match state {
                    RefreshMachineState::Idle => {
                        match (self.store.get(CredentialKind::Access), sent_token) {
                            (Some(current), sent) if Some(current.as_str()) != sent => {
                                debug!("Credentials changed since the call was sent, retrying");
                                return Ok(Recovery::Retry);
                            }
                            (None, None) => {
                                debug!("Call was anonymous, nothing to refresh");
                                return Ok(Recovery::Anonymous);
                            }
                            (None, Some(_)) => {
                                debug!("Session ended while the call was in flight");
                                return Err(PipelineError::SessionExpired);
                            }
                            _ => {}
                        }
                        transition(&mut inner.machine, RefreshMachineInput::Begin)?;
                        Role::Leader
                    }
                    RefreshMachineState::Refreshing => {
                        let (tx, rx) = oneshot::channel();
                        inner.waiters.push(tx);
                        Role::Waiter(rx)
                    }
                    other => {
                        return Err(PipelineError::InvalidStateTransition(format!(
                            "Refresh requested while {:?}",
                            other
                        )))
                    }
                }
            };

            match role {
                Role::Leader => return self.lead(on_expired).await,
                Role::Waiter(rx) => match rx.await {
                    Ok(RefreshSignal::Refreshed) => return Ok(Recovery::Retry),
                    Ok(RefreshSignal::Expired) => return Err(PipelineError::SessionExpired),
                    Err(_) => {
                        debug!("Refresh leader went away, contending again");
                        continue;
                    }
                },
            }
        }
    }

    async fn lead<F: FnOnce()>(&self, on_expired: F) -> PipelineResult<Recovery> {
        let guard = AbandonGuard {
            orchestrator: self,
            armed: true,
        };

        let result = match self.store.get(CredentialKind::Refresh) {
            Some(refresh_token) => self.executor.refresh(&refresh_token).await,
            None => Err(RefreshError::MissingRefreshToken),
        };
        guard.disarm();

        match result {
            Ok(pair) => {
                self.store.set_pair(&pair);
                let released = self.settle(RefreshMachineInput::Complete, RefreshSignal::Refreshed);
                info!(waiters = released, "Credentials refreshed");
                Ok(Recovery::Retry)
            }
            Err(e) => {
                warn!(error = %e, "Credential refresh failed, ending session");
                self.store.clear();
                on_expired();
                let released = self.settle(RefreshMachineInput::Reject, RefreshSignal::Expired);
                debug!(waiters = released, "Waiters notified of session expiry");
                Err(PipelineError::SessionExpired)
            }
        }
    }

    /// Apply the leader's result, release every waiter, return to `Idle`.
    fn settle(&self, input: RefreshMachineInput, signal: RefreshSignal) -> usize {
        let mut inner = self.inner.lock();

        let result = transition(&mut inner.machine, input)
            .and_then(|_| transition(&mut inner.machine, RefreshMachineInput::Settle));
        if let Err(e) = result {
            warn!(error = %e, "Resetting refresh state");
            inner.machine = RefreshMachine::new();
        }

        let waiters = std::mem::take(&mut inner.waiters);
        let released = waiters.len();
        for waiter in waiters {
            // A waiter whose caller was dropped is gone; nothing to do.
            let _ = waiter.send(signal);
        }
        released
    }

    fn abandon(&self) {
        let mut inner = self.inner.lock();
        if let Err(e) = transition(&mut inner.machine, RefreshMachineInput::Abandon) {
            warn!(error = %e, "Resetting refresh state");
            inner.machine = RefreshMachine::new();
        }
        // Dropping the senders wakes every waiter to contend again.
        let abandoned = std::mem::take(&mut inner.waiters);
        warn!(waiters = abandoned.len(), "Refresh abandoned");
    }
}

/// Returns the machine to `Idle` if the leader future is dropped mid-refresh.
struct AbandonGuard<'a> {
    orchestrator: &'a RefreshOrchestrator,
    armed: bool,
}

impl AbandonGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for AbandonGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.orchestrator.abandon();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BareTransport;
    use credential_storage::{create_memory_store, CredentialPair};
    use gql_transport::mock::ScriptedTransport;
    use gql_transport::{GraphQlError, Outcome};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn refreshed() -> Outcome {
        Outcome::success(json!({
            "refreshToken": { "accessToken": "a-2", "refreshToken": "r-2" }
        }))
    }

    fn orchestrator(
        transport: ScriptedTransport,
    ) -> (Arc<RefreshOrchestrator>, Arc<CredentialStore>, Arc<ScriptedTransport>) {
        let store = Arc::new(create_memory_store());
        store.set_pair(&CredentialPair::new("a-1", "r-1"));
        let transport = Arc::new(transport);
        let executor = RefreshExecutor::new(BareTransport::new(transport.clone()));
        let orchestrator = Arc::new(RefreshOrchestrator::new(store.clone(), executor));
        (orchestrator, store, transport)
    }

    #[test]
    fn test_machine_transitions() {
        let mut machine = RefreshMachine::new();
        assert_eq!(machine.state(), &RefreshMachineState::Idle);

        transition(&mut machine, RefreshMachineInput::Begin).unwrap();
        assert_eq!(machine.state(), &RefreshMachineState::Refreshing);
        assert!(transition(&mut machine, RefreshMachineInput::Begin).is_err());

        transition(&mut machine, RefreshMachineInput::Reject).unwrap();
        assert_eq!(machine.state(), &RefreshMachineState::Failed);
        transition(&mut machine, RefreshMachineInput::Settle).unwrap();
        assert_eq!(machine.state(), &RefreshMachineState::Idle);

        assert!(transition(&mut machine, RefreshMachineInput::Settle).is_err());
    }

    #[tokio::test]
    async fn test_successful_refresh_stores_new_pair() {
        let (orchestrator, store, transport) = orchestrator(ScriptedTransport::new(|_| refreshed()));

        let recovery = orchestrator.recover(Some("a-1"), || panic!("not expired")).await.unwrap();

        assert_eq!(recovery, Recovery::Retry);
        assert_eq!(store.pair(), Some(CredentialPair::new("a-2", "r-2")));
        assert_eq!(transport.call_count(), 1);
        assert_eq!(orchestrator.state(), RefreshMachineState::Idle);
    }

    #[tokio::test]
    async fn test_stale_token_skips_refresh() {
        let (orchestrator, _, transport) = orchestrator(ScriptedTransport::new(|_| refreshed()));

        let recovery = orchestrator.recover(Some("a-0"), || panic!("not expired")).await.unwrap();

        assert_eq!(recovery, Recovery::Retry);
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_anonymous_call_has_nothing_to_refresh() {
        let (orchestrator, store, transport) = orchestrator(ScriptedTransport::new(|_| refreshed()));
        store.clear();

        let recovery = orchestrator.recover(None, || panic!("never signed in")).await.unwrap();

        assert_eq!(recovery, Recovery::Anonymous);
        assert_eq!(transport.call_count(), 0);
        assert_eq!(orchestrator.state(), RefreshMachineState::Idle);
    }

    #[tokio::test]
    async fn test_cleared_session_does_not_expire_twice() {
        let (orchestrator, store, transport) = orchestrator(ScriptedTransport::new(|_| refreshed()));
        store.clear();

        let result = orchestrator.recover(Some("a-1"), || panic!("already expired")).await;

        assert!(matches!(result, Err(PipelineError::SessionExpired)));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_refresh_token_expires_without_network() {
        let (orchestrator, store, transport) = orchestrator(ScriptedTransport::new(|_| refreshed()));
        store.clear();
        store.set(CredentialKind::Access, "a-1");
        let expired = AtomicUsize::new(0);

        let result = orchestrator
            .recover(Some("a-1"), || {
                expired.fetch_add(1, Ordering::SeqCst);
            })
            .await;

        assert!(matches!(result, Err(PipelineError::SessionExpired)));
        assert_eq!(expired.load(Ordering::SeqCst), 1);
        assert_eq!(transport.call_count(), 0);
        assert!(store.pair().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_failures_share_one_refresh() {
        let (orchestrator, store, transport) = orchestrator(
            ScriptedTransport::new(|_| refreshed())
                .with_latency("RefreshToken", Duration::from_millis(50)),
        );

        let tasks: Vec<_> = (0..5)
            .map(|_| {
                let orchestrator = orchestrator.clone();
                tokio::spawn(async move { orchestrator.recover(Some("a-1"), || {}).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(transport.calls_named("RefreshToken"), 1);
        assert_eq!(store.get(CredentialKind::Access).as_deref(), Some("a-2"));
    }

    #[tokio::test]
    async fn test_rejected_refresh_expires_all_waiters_once() {
        let (orchestrator, store, _) = orchestrator(
            ScriptedTransport::new(|_| {
                Outcome::errors(vec![GraphQlError::unauthenticated("Refresh token revoked")])
            })
            .with_latency("RefreshToken", Duration::from_millis(50)),
        );
        let expired = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..3)
            .map(|_| {
                let orchestrator = orchestrator.clone();
                let expired = expired.clone();
                tokio::spawn(async move {
                    orchestrator
                        .recover(Some("a-1"), move || {
                            expired.fetch_add(1, Ordering::SeqCst);
                        })
                        .await
                })
            })
            .collect();
        for task in tasks {
            assert!(matches!(
                task.await.unwrap(),
                Err(PipelineError::SessionExpired)
            ));
        }

        assert_eq!(expired.load(Ordering::SeqCst), 1);
        assert!(store.pair().is_none());
        assert_eq!(orchestrator.state(), RefreshMachineState::Idle);
    }

    #[tokio::test]
    async fn test_dropped_leader_hands_over() {
        let (orchestrator, store, transport) = orchestrator(
            ScriptedTransport::new(|_| refreshed())
                .with_latency("RefreshToken", Duration::from_millis(200)),
        );

        let leader = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.recover(Some("a-1"), || {}).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(orchestrator.state(), RefreshMachineState::Refreshing);

        let waiter = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.recover(Some("a-1"), || {}).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        leader.abort();
        assert!(leader.await.unwrap_err().is_cancelled());

        waiter.await.unwrap().unwrap();
        assert_eq!(transport.calls_named("RefreshToken"), 2);
        assert_eq!(store.get(CredentialKind::Access).as_deref(), Some("a-2"));
        assert_eq!(orchestrator.state(), RefreshMachineState::Idle);
    }
}
