//! Bearer header injection.

use crate::PipelinePolicy;
use credential_storage::{CredentialKind, CredentialStore};
use gql_transport::{Operation, AUTHORIZATION_HEADER};

/// Set or clear the `authorization` header from the stored access token.
///
/// Exempt operations are always sent without the header. Returns the token
/// that was attached, if any.
pub fn authorize(
    store: &CredentialStore,
    policy: &PipelinePolicy,
    operation: &mut Operation,
) -> Option<String> {
    let token = if policy.is_exempt(&operation.name) {
        None
    } else {
        store.get(CredentialKind::Access)
    };

    match &token {
        Some(token) => operation.set_header(AUTHORIZATION_HEADER, format!("Bearer {}", token)),
        None => {
            operation.remove_header(AUTHORIZATION_HEADER);
        }
    }

    token
}
