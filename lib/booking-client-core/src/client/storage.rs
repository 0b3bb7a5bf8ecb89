use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde_json::{Map, Value};
use tracing::debug;

use super::auth::SecureString;
use super::error::StorageError;
use super::hosts::CredentialStore;

fn poisoned(what: &str) -> StorageError {
    StorageError::Unavailable {
        message: format!("{what} lock poisoned"),
    }
}

/// In-process credential store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, SecureString>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> Result<MutexGuard<'_, HashMap<String, SecureString>>, StorageError> {
        self.values.lock().map_err(|_| poisoned("memory store"))
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<SecureString>, StorageError> {
        Ok(self.values()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: SecureString) -> Result<(), StorageError> {
        self.values()?.insert(key.to_string(), value);
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), StorageError> {
        self.values()?.remove(key);
        Ok(())
    }

    fn clear_all(&self) -> Result<(), StorageError> {
        self.values()?.clear();
        Ok(())
    }
}

/// Credential store persisted as a JSON object file.
///
/// A missing file reads as an empty store. The file is read once, on first
/// access, and kept in memory afterwards; changes made to it by other
/// processes are not seen. Writes go through `std::fs` and rewrite the whole
/// file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    cache: Mutex<Option<Map<String, Value>>>,
}

type Cache<'a> = MutexGuard<'a, Option<Map<String, Value>>>;

impl FileStore {
    /// Creates a store backed by `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Map<String, Value>, StorageError> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(Map::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(Map::new()),
            Err(error) => Err(error.into()),
        }
    }

    fn save(&self, values: &Map<String, Value>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|it| !it.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_vec_pretty(values)?;
        fs::write(&self.path, content)?;
        debug!(path = %self.path.display(), entries = values.len(), "credential file written");
        Ok(())
    }

    fn cached(&self) -> Result<Cache<'_>, StorageError> {
        let mut cache = self.cache.lock().map_err(|_| poisoned("file store"))?;
        if cache.is_none() {
            *cache = Some(self.load()?);
        }
        Ok(cache)
    }

    fn update(&self, change: impl FnOnce(&mut Map<String, Value>)) -> Result<(), StorageError> {
        let mut cache = self.cached()?;
        let mut values = cache.clone().unwrap_or_default();
        change(&mut values);
        self.save(&values)?;
        *cache = Some(values);
        Ok(())
    }
}

impl CredentialStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<SecureString>, StorageError> {
        let cache = self.cached()?;
        let value = cache.as_ref().and_then(|values| values.get(key));
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(text)) => Ok(Some(SecureString::new(text.clone()))),
            Some(other) => Ok(Some(SecureString::new(other.to_string()))),
        }
    }

    fn set(&self, key: &str, value: SecureString) -> Result<(), StorageError> {
        self.update(|values| {
            values.insert(key.to_string(), Value::String(value.into_string()));
        })
    }

    fn clear(&self, key: &str) -> Result<(), StorageError> {
        self.update(|values| {
            values.remove(key);
        })
    }

    fn clear_all(&self) -> Result<(), StorageError> {
        self.update(Map::clear)
    }
}
