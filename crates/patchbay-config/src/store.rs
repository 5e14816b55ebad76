//! Key-value blob persistence.
//!
//! The scene library only needs "get bytes by key" and "put bytes by key";
//! [`BlobStore`] captures that so tests run against [`MemoryStore`] and the
//! CLI against a directory of files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Persistent key-value storage of opaque blobs.
pub trait BlobStore: std::fmt::Debug {
    /// Reads a blob. Missing keys yield `Ok(None)`.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ConfigError>;

    /// Writes a blob, replacing any previous value.
    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), ConfigError>;

    /// Deletes a blob. Returns `false` if the key was absent.
    fn remove(&mut self, key: &str) -> Result<bool, ConfigError>;
}

impl<S: BlobStore + ?Sized> BlobStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ConfigError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), ConfigError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<bool, ConfigError> {
        (**self).remove(key)
    }
}

/// Keys double as file names, so they are restricted to a safe alphabet.
pub fn validate_key(key: &str) -> Result<(), ConfigError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidKey(key.to_string()))
    }
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blobs: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl BlobStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ConfigError> {
        validate_key(key)?;
        Ok(self.blobs.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), ConfigError> {
        validate_key(key)?;
        self.blobs.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, ConfigError> {
        validate_key(key)?;
        Ok(self.blobs.remove(key).is_some())
    }
}

/// Store backed by one `<key>.json` file per blob in a directory.
///
/// The directory is created on first write.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Creates a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the blobs.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, ConfigError> {
        validate_key(key)?;
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl BlobStore for DirStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ConfigError> {
        let path = self.path_for(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ConfigError::read_file(path, e)),
        }
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), ConfigError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.root)
            .map_err(|e| ConfigError::create_dir(&self.root, e))?;
        std::fs::write(&path, value).map_err(|e| ConfigError::write_file(path, e))
    }

    fn remove(&mut self, key: &str) -> Result<bool, ConfigError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ConfigError::remove_file(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn exercise(store: &mut dyn BlobStore) {
        assert_eq!(store.get("scene.a").unwrap(), None);
        store.set("scene.a", b"one").unwrap();
        store.set("scene.a", b"two").unwrap();
        assert_eq!(store.get("scene.a").unwrap().as_deref(), Some(&b"two"[..]));
        assert!(store.remove("scene.a").unwrap());
        assert!(!store.remove("scene.a").unwrap());
        assert_eq!(store.get("scene.a").unwrap(), None);
    }

    #[test]
    fn memory_store_get_set_remove() {
        let mut store = MemoryStore::new();
        exercise(&mut store);
        assert!(store.is_empty());
    }

    #[test]
    fn dir_store_get_set_remove() {
        let dir = TempDir::new().unwrap();
        let mut store = DirStore::new(dir.path().join("scenes"));
        exercise(&mut store);
    }

    #[test]
    fn dir_store_writes_json_files() {
        let dir = TempDir::new().unwrap();
        let mut store = DirStore::new(dir.path());
        store.set("default-graph", b"{}").unwrap();
        assert!(dir.path().join("default-graph.json").exists());
    }

    #[test]
    fn unsafe_keys_are_rejected() {
        let mut store = MemoryStore::new();
        for key in ["", "../x", ".hidden", "a/b", "a b"] {
            assert!(
                matches!(store.set(key, b"x"), Err(ConfigError::InvalidKey(_))),
                "{key:?} accepted"
            );
        }
        assert!(validate_key("scene.my-mix_2").is_ok());
    }
}
