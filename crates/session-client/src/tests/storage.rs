//! Sessions over damaged or unwritable credential storage.

use super::harness::{TestHarness, EMAIL, PASSWORD};
use credential_storage::{
    create_file_store, CredentialKind, CredentialPair, CredentialStore, KeyValueStorage,
    StorageError, StorageResult,
};
use std::sync::Arc;
use tempfile::tempdir;

/// Backend that reads as empty and refuses every write.
struct ReadOnlyStorage;

impl KeyValueStorage for ReadOnlyStorage {
    fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
        Err(StorageError::Io(std::io::Error::other("read-only file system")))
    }

    fn get(&self, _key: &str) -> StorageResult<Option<String>> {
        Ok(None)
    }

    fn delete(&self, _key: &str) -> StorageResult<bool> {
        Ok(false)
    }
}

#[tokio::test]
async fn login_replaces_corrupt_credential_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("credentials.json");
    std::fs::write(&path, "{garbage").unwrap();

    let h = TestHarness::with_store(Arc::new(create_file_store(&path)));
    h.client.login(EMAIL, PASSWORD).await.unwrap();

    assert!(h.client.session().is_authenticated);
    assert_eq!(
        create_file_store(&path).pair(),
        Some(CredentialPair::new("access-1", "refresh-1"))
    );
    assert!(h.client.check_auth().await);
}

#[tokio::test]
async fn logout_repairs_corrupt_credential_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("credentials.json");
    std::fs::write(&path, "{garbage").unwrap();

    let h = TestHarness::with_store(Arc::new(create_file_store(&path)));
    h.client.logout();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(serde_json::from_str::<serde_json::Value>(&content).is_ok());
    assert!(!h.store.has(CredentialKind::Access));
}

#[tokio::test]
async fn unstored_credentials_leave_session_signed_out() {
    let store = Arc::new(CredentialStore::new(Box::new(ReadOnlyStorage)));
    let h = TestHarness::with_store(store);

    let user = h.client.login(EMAIL, PASSWORD).await.unwrap();

    assert_eq!(user.email, EMAIL);
    assert_eq!(h.client.session(), TestHarness::signed_out());
    assert!(!h.client.check_auth().await);
}
