//! Outcome classification.
//!
//! Decides whether a failed operation may be recovered by refreshing
//! credentials, and converts everything else into a [`PipelineError`].

use crate::{PipelineError, PipelinePolicy};
use gql_transport::{GraphQlError, Operation, Outcome, UNAUTHENTICATED_CODE};
use serde_json::Value;
use tracing::warn;

/// Category of a single GraphQL error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Unauthenticated,
    OtherGraphQl,
}

/// What the pipeline should do with an outcome.
#[derive(Debug)]
pub enum Verdict {
    Success(Value),
    /// Credentials were rejected and one refresh-and-retry is allowed. Holds
    /// the error to surface when there is nothing to refresh.
    RefreshEligible(PipelineError),
    Fail(PipelineError),
}

pub fn classify_error(policy: &PipelinePolicy, error: &GraphQlError) -> ErrorClass {
    let code_matches = error
        .code
        .as_deref()
        .is_some_and(|code| code.eq_ignore_ascii_case(UNAUTHENTICATED_CODE));

    if code_matches || policy.message_signals_auth_failure(&error.message) {
        ErrorClass::Unauthenticated
    } else {
        ErrorClass::OtherGraphQl
    }
}

/// Classify the outcome of `operation`, logging every error it carries.
pub fn classify(policy: &PipelinePolicy, operation: &Operation, outcome: Outcome) -> Verdict {
    if let Some(reason) = outcome.network_failure {
        warn!(
            operation = %operation.name,
            request_id = %operation.id,
            reason = %reason,
            "Network error"
        );
        return Verdict::Fail(PipelineError::Network(reason));
    }

    if outcome.errors.is_empty() {
        return Verdict::Success(outcome.data.unwrap_or(Value::Null));
    }

    let mut unauthenticated = false;
    for error in &outcome.errors {
        let class = classify_error(policy, error);
        warn!(
            operation = %operation.name,
            request_id = %operation.id,
            message = %error.message,
            code = error.code.as_deref().unwrap_or("-"),
            path = error.path_display().as_deref().unwrap_or("-"),
            class = ?class,
            "GraphQL error"
        );
        unauthenticated |= class == ErrorClass::Unauthenticated;
    }

    let message = outcome.errors[0].message.clone();
    if !unauthenticated {
        return Verdict::Fail(PipelineError::Validation {
            message,
            code: outcome.errors[0].code.clone(),
            errors: outcome.errors,
        });
    }

    let rejection = PipelineError::Unauthenticated { message };
    if operation.retry_marked || policy.is_exempt(&operation.name) {
        Verdict::Fail(rejection)
    } else {
        Verdict::RefreshEligible(rejection)
    }
}
