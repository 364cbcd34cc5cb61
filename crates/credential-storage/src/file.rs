//! File-backed storage backend.
//!
//! All keys live in one JSON object. Every write replaces the whole file via a
//! temporary sibling and a rename, so readers never observe a half-written
//! credential pair.

use crate::{KeyValueStorage, StorageError, StorageResult};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

type Entries = BTreeMap<String, String>;

/// Persists credentials to a JSON file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> StorageResult<Entries> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(Entries::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Entries::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Read before a write. A corrupt file reads as empty, so the write
    /// replaces it.
    fn read_for_write(&self) -> StorageResult<Entries> {
        match self.read() {
            Err(StorageError::Json(e)) => {
                warn!(path = %self.path.display(), error = %e, "Replacing corrupt credential file");
                Ok(Entries::new())
            }
            other => other,
        }
    }

    fn write(&self, entries: &Entries) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension("tmp");
        let content = serde_json::to_vec_pretty(entries)?;
        {
            let mut file = std::fs::File::create(&tmp_path)?;
            restrict_permissions(&file)?;
            file.write_all(&content)?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }

    fn update<T>(&self, apply: impl FnOnce(&mut Entries) -> T) -> StorageResult<T> {
        let _guard = self.lock.lock();
        let mut entries = self.read_for_write()?;
        let result = apply(&mut entries);
        self.write(&entries)?;
        Ok(result)
    }
}

#[cfg(unix)]
fn restrict_permissions(file: &std::fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &std::fs::File) -> std::io::Result<()> {
    Ok(())
}

impl KeyValueStorage for FileStorage {
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let _guard = self.lock.lock();
        Ok(self.read()?.remove(key))
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        let _guard = self.lock.lock();
        let mut entries = self.read_for_write()?;
        if entries.remove(key).is_none() {
            return Ok(false);
        }
        self.write(&entries)?;
        Ok(true)
    }

    fn set_many(&self, new_entries: &[(&str, &str)]) -> StorageResult<()> {
        self.update(|entries| {
            for (key, value) in new_entries {
                entries.insert(key.to_string(), value.to_string());
            }
        })
    }

    fn delete_many(&self, keys: &[&str]) -> StorageResult<()> {
        self.update(|entries| {
            for key in keys {
                entries.remove(*key);
            }
        })
    }
}
