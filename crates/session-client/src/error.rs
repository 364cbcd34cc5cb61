//! Session error types.

use auth_pipeline::PipelineError;
use thiserror::Error;

/// Error returned by session operations.
///
/// Displays the underlying message unchanged, so a server's
/// "Invalid credentials" reaches the user verbatim.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct SessionError(#[from] PipelineError);

impl SessionError {
    pub fn is_unauthenticated(&self) -> bool {
        self.0.is_unauthenticated()
    }

    pub fn pipeline_error(&self) -> &PipelineError {
        &self.0
    }

    pub fn into_pipeline_error(self) -> PipelineError {
        self.0
    }
}

/// Result type alias using SessionError.
pub type SessionResult<T> = Result<T, SessionError>;
