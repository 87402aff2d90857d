use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::SessionStoreError;

/// Host persistent key-value facility.
///
/// Keys are short record names chosen by this crate; values are opaque text.
/// `set` must replace the stored value atomically with respect to a
/// subsequent `get` — a reader sees either the old value or the new one,
/// never a partial write.
pub trait StorageBackend: Send + 'static {
    fn get(&self, key: &str) -> Result<Option<String>, SessionStoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), SessionStoreError>;
    fn clear(&mut self, key: &str) -> Result<(), SessionStoreError>;
}

/// File-per-record backend rooted at a directory.
///
/// Each record is stored as `<root>/<key>.json`. Writes go to a sibling
/// temporary file and are published with an atomic rename.
#[derive(Debug)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl StorageBackend for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, SessionStoreError> {
        let path = self.record_path(key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(SessionStoreError::io("reading record", &path, source)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SessionStoreError> {
        fs::create_dir_all(&self.root)
            .map_err(|source| SessionStoreError::io("creating storage root", &self.root, source))?;

        let path = self.record_path(key);
        let tmp_path = self.root.join(format!("{key}.json.tmp"));
        fs::write(&tmp_path, value)
            .map_err(|source| SessionStoreError::io("writing record", &tmp_path, source))?;
        fs::rename(&tmp_path, &path)
            .map_err(|source| SessionStoreError::io("publishing record", &path, source))?;

        Ok(())
    }

    fn clear(&mut self, key: &str) -> Result<(), SessionStoreError> {
        let path = self.record_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SessionStoreError::io("clearing record", &path, source)),
        }
    }
}

/// In-process backend for tests and headless embedding.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryStorage {
    records: HashMap<String, String>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a record, bypassing the store's validation path.
    pub fn insert_raw(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.records.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.records.get(key).map(String::as_str)
    }
}

impl StorageBackend for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, SessionStoreError> {
        Ok(self.records.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SessionStoreError> {
        self.records.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&mut self, key: &str) -> Result<(), SessionStoreError> {
        self.records.remove(key);
        Ok(())
    }
}
