//! GraphQL operations, outcomes and transports.
//!
//! An [`Operation`] is one query or mutation with its variables and headers.
//! A [`Transport`] executes it and always answers with an [`Outcome`]: data,
//! a list of structured [`GraphQlError`]s, or a transport-level failure.
//! Transports apply no middleware; authentication lives in `auth-pipeline`.

mod error;
mod http;
mod operation;
mod outcome;
mod transport;

#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use error::{TransportError, TransportResult};
pub use http::HttpTransport;
pub use operation::{FetchPolicy, Operation, OperationKind, AUTHORIZATION_HEADER};
pub use outcome::{GraphQlError, Outcome, PathSegment, UNAUTHENTICATED_CODE};
pub use transport::Transport;
