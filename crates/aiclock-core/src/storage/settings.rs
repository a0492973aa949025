//! Namespaced integer settings.
//!
//! Mirrors a flash key/value partition: each namespace holds integer values
//! under short keys. [`FileStore`] keeps one TOML table per namespace at
//! `<data_dir>/settings.toml`; [`MemoryStore`] is for tests and simulations.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::StoreError;

type Namespaces = BTreeMap<String, BTreeMap<String, i64>>;

/// Persisted key/value store for integer settings.
pub trait SettingsStore {
    /// Read a value. `Ok(None)` when the key has never been written.
    fn get_int(&self, namespace: &str, key: &str) -> Result<Option<i64>, StoreError>;

    /// Write a value and make it durable before returning.
    fn set_int(&mut self, namespace: &str, key: &str, value: i64) -> Result<(), StoreError>;

    /// Delete a key. Deleting a missing key is not an error.
    fn remove(&mut self, namespace: &str, key: &str) -> Result<(), StoreError>;
}

/// Volatile store.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    data: Namespaces,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, namespace: &str, key: &str, value: i64) -> Self {
        insert(&mut self.data, namespace, key, value);
        self
    }
}

impl SettingsStore for MemoryStore {
    fn get_int(&self, namespace: &str, key: &str) -> Result<Option<i64>, StoreError> {
        Ok(lookup(&self.data, namespace, key))
    }

    fn set_int(&mut self, namespace: &str, key: &str, value: i64) -> Result<(), StoreError> {
        insert(&mut self.data, namespace, key, value);
        Ok(())
    }

    fn remove(&mut self, namespace: &str, key: &str) -> Result<(), StoreError> {
        if let Some(table) = self.data.get_mut(namespace) {
            table.remove(key);
        }
        Ok(())
    }
}

/// TOML-file-backed store. Every write rewrites the whole file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    data: Namespaces,
}

impl FileStore {
    /// Open `<data_dir>/settings.toml`.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the file is
    /// not valid TOML.
    pub fn open_default() -> Result<Self, StoreError> {
        let dir = super::data_dir().map_err(|e| StoreError::ReadFailed {
            path: PathBuf::from("settings.toml"),
            message: e.to_string(),
        })?;
        Self::open(dir.join("settings.toml"))
    }

    /// Open a store at `path`; a missing file is an empty store.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let data = match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| StoreError::ReadFailed {
                path: path.clone(),
                message: e.to_string(),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Namespaces::new(),
            Err(e) => {
                return Err(StoreError::ReadFailed {
                    path,
                    message: e.to_string(),
                })
            }
        };
        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        let write_err = |message: String| StoreError::WriteFailed {
            path: self.path.clone(),
            message,
        };
        let content = toml::to_string_pretty(&self.data).map_err(|e| write_err(e.to_string()))?;
        std::fs::write(&self.path, content).map_err(|e| write_err(e.to_string()))
    }
}

impl SettingsStore for FileStore {
    fn get_int(&self, namespace: &str, key: &str) -> Result<Option<i64>, StoreError> {
        Ok(lookup(&self.data, namespace, key))
    }

    fn set_int(&mut self, namespace: &str, key: &str, value: i64) -> Result<(), StoreError> {
        insert(&mut self.data, namespace, key, value);
        self.flush()
    }

    fn remove(&mut self, namespace: &str, key: &str) -> Result<(), StoreError> {
        let removed = self
            .data
            .get_mut(namespace)
            .and_then(|table| table.remove(key))
            .is_some();
        if removed {
            self.flush()?;
        }
        Ok(())
    }
}

fn lookup(data: &Namespaces, namespace: &str, key: &str) -> Option<i64> {
    data.get(namespace).and_then(|table| table.get(key)).copied()
}

fn insert(data: &mut Namespaces, namespace: &str, key: &str, value: i64) {
    data.entry(namespace.to_string())
        .or_default()
        .insert(key.to_string(), value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_is_namespaced() {
        let mut store = MemoryStore::new();
        store.set_int("alarm", "wake_hour", 7).unwrap();
        assert_eq!(store.get_int("alarm", "wake_hour").unwrap(), Some(7));
        assert_eq!(store.get_int("other", "wake_hour").unwrap(), None);
        store.remove("alarm", "wake_hour").unwrap();
        assert_eq!(store.get_int("alarm", "wake_hour").unwrap(), None);
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        let mut store = FileStore::open(&path).unwrap();
        store.set_int("alarm", "wake_hour", 6).unwrap();
        store.set_int("alarm", "wake_min", 45).unwrap();
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get_int("alarm", "wake_hour").unwrap(), Some(6));
        assert_eq!(reopened.get_int("alarm", "wake_min").unwrap(), Some(45));
    }

    #[test]
    fn file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[alarm]\nwake_hour = \"seven\"\n").unwrap();
        assert!(FileStore::open(&path).is_err());
    }

    #[test]
    fn missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("absent.toml")).unwrap();
        assert_eq!(store.get_int("alarm", "wake_hour").unwrap(), None);
    }
}
