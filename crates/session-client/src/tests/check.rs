//! Server-side session checks.

use super::harness::{TestHarness, EMAIL, PASSWORD};
use crate::documents::{GET_ME_DOCUMENT, GET_ME_OPERATION};
use credential_storage::{create_memory_store, CredentialPair};
use gql_transport::Operation;
use std::sync::Arc;

#[tokio::test]
async fn check_without_token_makes_no_calls() {
    let h = TestHarness::new();

    assert!(!h.client.check_auth().await);

    assert_eq!(h.transport.call_count(), 0);
    assert_eq!(h.client.session(), TestHarness::signed_out());
}

#[tokio::test]
async fn login_then_check_loads_profile() {
    let h = TestHarness::new();
    h.client.login(EMAIL, PASSWORD).await.unwrap();

    assert!(h.client.check_auth().await);

    let session = h.client.session();
    let user = session.user.unwrap();
    assert_eq!(user.id, "user-1");
    assert_eq!(user.email, EMAIL);
    assert_eq!(user.display_name(), "Ada Lovelace");
    assert!(session.is_authenticated);
    assert!(!session.is_loading);
}

#[tokio::test]
async fn check_is_never_served_from_cache() {
    let h = TestHarness::new();
    h.client.login(EMAIL, PASSWORD).await.unwrap();

    assert!(h.client.check_auth().await);
    assert!(h.client.check_auth().await);

    assert_eq!(h.transport.calls_named("GetMe"), 2);
}

#[tokio::test]
async fn check_refreshes_expired_access() {
    let h = TestHarness::new();
    h.client.login(EMAIL, PASSWORD).await.unwrap();
    h.server.expire_access();

    assert!(h.client.check_auth().await);

    assert_eq!(h.transport.calls_named("RefreshToken"), 1);
    assert_eq!(h.transport.calls_named("GetMe"), 2);
    assert_eq!(h.store.pair(), Some(CredentialPair::new("access-2", "refresh-2")));
}

#[tokio::test]
async fn rejected_refresh_forces_logout() {
    let h = TestHarness::new();
    h.client.login(EMAIL, PASSWORD).await.unwrap();
    h.server.expire_access();
    h.server.reject_refresh();

    assert!(!h.client.check_auth().await);

    assert!(h.store.pair().is_none());
    let session = h.client.session();
    assert!(session.user.is_none());
    assert!(!session.is_authenticated);
    assert_eq!(h.navigator.visits(), vec!["/".to_string()]);
}

#[tokio::test]
async fn unknown_stored_token_is_cleared() {
    let store = Arc::new(create_memory_store());
    store.set_pair(&CredentialPair::new("forged", "forged"));
    let h = TestHarness::with_store(store);

    assert!(!h.client.check_auth().await);

    assert!(h.store.pair().is_none());
    assert!(!h.client.session().is_authenticated);
}

#[tokio::test]
async fn rejected_check_drops_cached_responses() {
    let h = TestHarness::new();
    h.client.login(EMAIL, PASSWORD).await.unwrap();
    let cached = Operation::query(GET_ME_OPERATION, GET_ME_DOCUMENT);
    h.client.pipeline().execute(cached.clone()).await.unwrap();
    assert_eq!(h.client.pipeline().cache().len(), 1);

    h.server.reject_me();
    assert!(!h.client.check_auth().await);

    assert!(h.store.pair().is_none());
    assert!(h.client.pipeline().cache().is_empty());
    assert!(h.client.pipeline().cache().lookup(&cached).is_none());
    assert!(h.navigator.visits().is_empty());
}

#[tokio::test]
async fn network_failure_keeps_credentials() {
    let h = TestHarness::new();
    h.client.login(EMAIL, PASSWORD).await.unwrap();
    h.server.go_offline();

    assert!(!h.client.check_auth().await);

    assert!(h.store.pair().is_some());
    assert!(!h.client.session().is_authenticated);
    assert_eq!(h.transport.calls_named("RefreshToken"), 0);
}
