//! Token-aware GraphQL request pipeline.
//!
//! [`AuthPipeline`] chains the stages every operation goes through:
//!
//! 1. [`ResponseCache`] answers cache-first queries it has already seen.
//! 2. The auth link attaches `authorization: Bearer <access token>` to
//!    operations that are not credential-issuing.
//! 3. The [`Transport`](gql_transport::Transport) executes the operation.
//! 4. The classifier decides between success, plain failure, and a
//!    refresh-eligible credential failure.
//! 5. [`RefreshOrchestrator`] runs one refresh for all concurrent failures
//!    and the operation is retried once.
//!
//! A failed refresh clears the credentials, empties the cache, notifies
//! session-expiry listeners, and triggers [`ForcedLogout`].

mod auth_link;
mod cache;
mod classify;
mod error;
mod executor;
mod navigator;
mod orchestrator;
mod pipeline;
mod policy;

#[cfg(test)]
mod tests;

pub use auth_link::authorize;
pub use cache::ResponseCache;
pub use classify::{classify, classify_error, ErrorClass, Verdict};
pub use error::{PipelineError, PipelineResult, RefreshError};
pub use executor::{BareTransport, RefreshExecutor, REFRESH_DOCUMENT, REFRESH_OPERATION};
pub use navigator::{ForcedLogout, Navigator};
pub use orchestrator::{Recovery, RefreshMachineState, RefreshOrchestrator};
pub use pipeline::{AuthPipeline, ExpiryListener};
pub use policy::PipelinePolicy;
