//! Pipeline error types.

use gql_transport::GraphQlError;
use thiserror::Error;

/// Error returned to callers of the pipeline.
///
/// Server-provided messages are carried verbatim so they can be shown as-is.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The server rejected the operation for a reason other than credentials.
    #[error("{message}")]
    Validation {
        message: String,
        code: Option<String>,
        errors: Vec<GraphQlError>,
    },

    /// Credentials were missing or rejected and could not be recovered.
    #[error("{message}")]
    Unauthenticated { message: String },

    /// Credential refresh failed; the session has been ended.
    #[error("Session expired")]
    SessionExpired,

    /// No GraphQL response was obtained.
    #[error("Network error: {0}")]
    Network(String),

    /// Response data did not match the expected shape.
    #[error("Unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),

    /// The server answered without data for this operation.
    #[error("Empty response for {0}")]
    EmptyResponse(String),

    /// Refresh state machine rejected a transition.
    #[error("Invalid refresh state transition: {0}")]
    InvalidStateTransition(String),
}

impl PipelineError {
    /// Whether this error means the caller is not (or no longer) signed in.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            PipelineError::Unauthenticated { .. } | PipelineError::SessionExpired
        )
    }

    /// Returns true if this error is transient and the operation can be retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, PipelineError::Network(_))
    }
}

/// Result type alias using PipelineError.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Why a credential refresh did not produce a new pair.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    /// No refresh credential is stored.
    #[error("No refresh token available")]
    MissingRefreshToken,

    /// The refresh call never reached the server.
    #[error("Network error during refresh: {0}")]
    Network(String),

    /// The server refused the refresh credential.
    #[error("Refresh rejected: {0}")]
    Rejected(String),

    /// The server answered without a usable credential pair.
    #[error("Malformed refresh response: {0}")]
    Malformed(String),
}
