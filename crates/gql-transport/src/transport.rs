//! Transport trait.

use crate::{Operation, Outcome};
use async_trait::async_trait;

/// Sends an operation to a server.
///
/// Implementations never fail: connection problems are reported as
/// [`Outcome::network`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, operation: &Operation) -> Outcome;
}
