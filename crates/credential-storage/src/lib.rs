//! Credential storage for authctl.
//!
//! The access and refresh credentials are opaque strings kept in a
//! [`KeyValueStorage`] backend:
//! - [`MemoryStorage`]: lives as long as the process
//! - [`FileStorage`]: a JSON file that survives restarts
//!
//! [`CredentialStore`] is the API the rest of the workspace uses. It never
//! returns errors: a backend failure is logged and treated as "absent".

mod credentials;
mod file;
mod keys;
mod memory;
mod traits;

pub use credentials::{CredentialKind, CredentialPair, CredentialStore};
pub use file::FileStorage;
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use traits::KeyValueStorage;

use std::path::PathBuf;
use thiserror::Error;

/// Error type for storage backends.
#[derive(Error, Debug)]
pub enum StorageError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file is not a JSON object of strings
    #[error("Corrupt credential file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Create a credential store persisted at `path`.
pub fn create_file_store(path: impl Into<PathBuf>) -> CredentialStore {
    CredentialStore::new(Box::new(FileStorage::new(path)))
}

/// Create a credential store that forgets everything on exit.
pub fn create_memory_store() -> CredentialStore {
    CredentialStore::new(Box::new(MemoryStorage::new()))
}
