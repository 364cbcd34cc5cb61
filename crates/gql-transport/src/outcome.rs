//! Outcome of executing an operation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Error code servers use for missing or expired credentials.
pub const UNAUTHENTICATED_CODE: &str = "UNAUTHENTICATED";

/// One element of a GraphQL error path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(u64),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

/// A structured error returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireError", into = "WireError")]
pub struct GraphQlError {
    pub message: String,
    /// `extensions.code` on the wire.
    pub code: Option<String>,
    pub path: Option<Vec<PathSegment>>,
}

impl GraphQlError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            path: None,
        }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(message).with_code(UNAUTHENTICATED_CODE)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = Some(path);
        self
    }

    /// Dotted rendering of the path, e.g. `me.email`.
    pub fn path_display(&self) -> Option<String> {
        self.path.as_ref().map(|segments| {
            segments
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(".")
        })
    }
}

impl fmt::Display for GraphQlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Serialize, Deserialize)]
struct WireError {
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    path: Option<Vec<PathSegment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    extensions: Option<WireExtensions>,
}

#[derive(Serialize, Deserialize)]
struct WireExtensions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl From<WireError> for GraphQlError {
    fn from(wire: WireError) -> Self {
        Self {
            message: wire.message,
            code: wire.extensions.and_then(|e| e.code),
            path: wire.path,
        }
    }
}

impl From<GraphQlError> for WireError {
    fn from(error: GraphQlError) -> Self {
        Self {
            message: error.message,
            path: error.path,
            extensions: error.code.map(|code| WireExtensions { code: Some(code) }),
        }
    }
}

/// What a transport returned for one operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    pub data: Option<Value>,
    pub errors: Vec<GraphQlError>,
    /// Set when no GraphQL response was obtained at all.
    pub network_failure: Option<String>,
}

impl Outcome {
    pub fn success(data: Value) -> Self {
        Self {
            data: Some(data),
            ..Self::default()
        }
    }

    pub fn errors(errors: Vec<GraphQlError>) -> Self {
        Self {
            errors,
            ..Self::default()
        }
    }

    pub fn network_failure(reason: impl Into<String>) -> Self {
        Self {
            network_failure: Some(reason.into()),
            ..Self::default()
        }
    }

    /// A response with no errors and no transport failure.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && self.network_failure.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_reads_code_from_extensions() {
        let error: GraphQlError = serde_json::from_value(json!({
            "message": "You must be logged in",
            "path": ["me", 0, "email"],
            "extensions": { "code": "UNAUTHENTICATED", "stacktrace": [] }
        }))
        .unwrap();

        assert_eq!(error.code.as_deref(), Some(UNAUTHENTICATED_CODE));
        assert_eq!(error.path_display().as_deref(), Some("me.0.email"));
        assert_eq!(error.to_string(), "You must be logged in");
    }

    #[test]
    fn test_error_without_extensions() {
        let error: GraphQlError =
            serde_json::from_value(json!({ "message": "Invalid credentials" })).unwrap();

        assert_eq!(error, GraphQlError::new("Invalid credentials"));
        assert!(error.path_display().is_none());
    }

    #[test]
    fn test_outcome_constructors() {
        assert!(Outcome::success(json!({"me": null})).is_success());
        assert!(!Outcome::errors(vec![GraphQlError::unauthenticated("expired")]).is_success());

        let failed = Outcome::network_failure("connection refused");
        assert!(!failed.is_success());
        assert!(failed.data.is_none());
    }
}
