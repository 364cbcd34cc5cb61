//! High-level API for the access/refresh credential pair.

use crate::{KeyValueStorage, StorageKeys};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Which credential of the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKind {
    /// Short-lived bearer token for protected calls.
    Access,
    /// Longer-lived token used only to obtain a new access token.
    Refresh,
}

impl CredentialKind {
    /// Storage key for this credential.
    pub fn key(self) -> &'static str {
        match self {
            CredentialKind::Access => StorageKeys::ACCESS_TOKEN,
            CredentialKind::Refresh => StorageKeys::REFRESH_TOKEN,
        }
    }
}

/// Access and refresh credentials issued together.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl CredentialPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

// Tokens must never end up in logs.
impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Credential store over any [`KeyValueStorage`] backend.
///
/// None of these methods fail. Backend errors are logged and the credential
/// is reported as absent.
pub struct CredentialStore {
    storage: Box<dyn KeyValueStorage>,
}

impl CredentialStore {
    /// Create a new credential store with the given storage backend
    pub fn new(storage: Box<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Read one credential.
    pub fn get(&self, kind: CredentialKind) -> Option<String> {
        match self.storage.get(kind.key()) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                warn!(credential = ?kind, error = %e, "Credential read failed, treating as absent");
                None
            }
        }
    }

    /// Whether a credential is present.
    pub fn has(&self, kind: CredentialKind) -> bool {
        self.get(kind).is_some()
    }

    /// Write one credential.
    pub fn set(&self, kind: CredentialKind, value: &str) {
        if let Err(e) = self.storage.set(kind.key(), value) {
            warn!(credential = ?kind, error = %e, "Credential write failed");
        }
    }

    /// Replace both credentials in one backend write.
    pub fn set_pair(&self, pair: &CredentialPair) {
        let entries = [
            (StorageKeys::ACCESS_TOKEN, pair.access_token.as_str()),
            (StorageKeys::REFRESH_TOKEN, pair.refresh_token.as_str()),
        ];
        if let Err(e) = self.storage.set_many(&entries) {
            warn!(error = %e, "Credential pair write failed");
        }
    }

    /// Both credentials, if both are present.
    pub fn pair(&self) -> Option<CredentialPair> {
        Some(CredentialPair {
            access_token: self.get(CredentialKind::Access)?,
            refresh_token: self.get(CredentialKind::Refresh)?,
        })
    }

    /// Remove both credentials.
    pub fn clear(&self) {
        let keys = [StorageKeys::ACCESS_TOKEN, StorageKeys::REFRESH_TOKEN];
        if let Err(e) = self.storage.delete_many(&keys) {
            warn!(error = %e, "Credential clear failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStorage, StorageError, StorageResult};

    /// Backend whose every call fails.
    struct BrokenStorage;

    impl KeyValueStorage for BrokenStorage {
        fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
            Err(StorageError::Io(std::io::Error::other("disk full")))
        }

        fn get(&self, _key: &str) -> StorageResult<Option<String>> {
            Err(StorageError::Io(std::io::Error::other("permission denied")))
        }

        fn delete(&self, _key: &str) -> StorageResult<bool> {
            Err(StorageError::Io(std::io::Error::other("permission denied")))
        }
    }

    fn memory_store() -> CredentialStore {
        CredentialStore::new(Box::new(MemoryStorage::new()))
    }

    #[test]
    fn test_set_and_get_each_kind() {
        let store = memory_store();
        assert!(store.get(CredentialKind::Access).is_none());

        store.set(CredentialKind::Access, "access-1");
        store.set(CredentialKind::Refresh, "refresh-1");

        assert_eq!(store.get(CredentialKind::Access).as_deref(), Some("access-1"));
        assert_eq!(store.get(CredentialKind::Refresh).as_deref(), Some("refresh-1"));
    }

    #[test]
    fn test_set_pair_and_clear() {
        let store = memory_store();
        store.set_pair(&CredentialPair::new("a", "r"));

        assert_eq!(store.pair(), Some(CredentialPair::new("a", "r")));

        store.clear();
        assert!(store.pair().is_none());
        assert!(!store.has(CredentialKind::Access));
        assert!(!store.has(CredentialKind::Refresh));

        // Clearing an empty store is fine.
        store.clear();
    }

    #[test]
    fn test_pair_requires_both() {
        let store = memory_store();
        store.set(CredentialKind::Access, "only-access");

        assert!(store.pair().is_none());
    }

    #[test]
    fn test_empty_value_is_absent() {
        let store = memory_store();
        store.set(CredentialKind::Access, "");

        assert!(!store.has(CredentialKind::Access));
    }

    #[test]
    fn test_backend_failures_degrade_to_absent() {
        let store = CredentialStore::new(Box::new(BrokenStorage));

        store.set(CredentialKind::Access, "a");
        store.set_pair(&CredentialPair::new("a", "r"));
        store.clear();

        assert!(store.get(CredentialKind::Access).is_none());
        assert!(store.pair().is_none());
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let rendered = format!("{:?}", CredentialPair::new("secret-a", "secret-r"));
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn test_storage_keys_are_distinct() {
        assert_ne!(CredentialKind::Access.key(), CredentialKind::Refresh.key());
        assert_eq!(CredentialKind::Access.key(), "access_token");
        assert_eq!(CredentialKind::Refresh.key(), "refresh_token");
    }
}
