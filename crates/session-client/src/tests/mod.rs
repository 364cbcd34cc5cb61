//! Scenario tests for the session client.
//!
//! - `harness.rs` - Fake auth server and client wiring
//! - `login.rs`   - Login, registration and logout
//! - `check.rs`   - Server-side session checks and forced logout
//! - `storage.rs` - Sessions over damaged or unwritable credential storage

mod check;
mod storage;
