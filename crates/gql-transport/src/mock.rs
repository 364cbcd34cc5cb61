//! Scripted transport for tests.

use crate::{Operation, Outcome, Transport};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

type Handler = Box<dyn Fn(&Operation) -> Outcome + Send + Sync>;

/// Answers every operation through a closure and records what it was sent.
///
/// Calls are recorded before any injected latency elapses, so concurrent
/// in-flight operations are visible to assertions.
pub struct ScriptedTransport {
    handler: Handler,
    latency: HashMap<String, Duration>,
    calls: Mutex<Vec<Operation>>,
}

impl ScriptedTransport {
    pub fn new(handler: impl Fn(&Operation) -> Outcome + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            latency: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Delay every response to `operation_name`.
    pub fn with_latency(mut self, operation_name: impl Into<String>, delay: Duration) -> Self {
        self.latency.insert(operation_name.into(), delay);
        self
    }

    /// Every operation received, in order.
    pub fn calls(&self) -> Vec<Operation> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls_named(&self, name: &str) -> usize {
        self.calls.lock().iter().filter(|op| op.name == name).count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, operation: &Operation) -> Outcome {
        self.calls.lock().push(operation.clone());

        if let Some(delay) = self.latency.get(&operation.name) {
            tokio::time::sleep(*delay).await;
        }

        (self.handler)(operation)
    }
}
