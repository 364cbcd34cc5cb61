//! Transport construction errors.

use thiserror::Error;

/// Errors raised while building a transport. Request failures are reported
/// inside [`crate::Outcome`] instead.
#[derive(Error, Debug)]
pub enum TransportError {
    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    /// Endpoint is not usable
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Result type alias using TransportError.
pub type TransportResult<T> = Result<T, TransportError>;
