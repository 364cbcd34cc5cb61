//! Session management for authctl.
//!
//! [`SessionClient`] owns the signed-in user's [`Session`] and drives login,
//! registration, logout and server-side session checks through an
//! [`AuthPipeline`](auth_pipeline::AuthPipeline).

mod client;
pub mod documents;
mod error;
mod model;

#[cfg(test)]
mod tests;

pub use client::{SessionCallback, SessionClient};
pub use error::{SessionError, SessionResult};
pub use model::{RegisterInput, Session, User};
