//! Scenario tests for the auth pipeline.
//!
//! - `harness.rs`  - Fake GraphQL server, recording navigator, pipeline wiring
//! - `refresh.rs`  - Refresh-and-retry, single-flight, retry bound, stale tokens
//! - `exemption.rs` - Credential-issuing operations
//! - `expiry.rs`   - Failed refresh ends the session exactly once
//! - `cache.rs`    - Fetch policies and cache invalidation

pub(crate) mod harness;
