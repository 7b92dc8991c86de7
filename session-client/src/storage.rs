use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Durable client-side storage for the bearer token and the serialized
/// identity snapshot. The pair is always written and cleared together, so a
/// reader either sees both values or neither.
pub trait SessionStorage: Send + Sync {
    /// Returns `(token, identity_json)` when a pair is persisted.
    fn read(&self) -> Result<Option<(String, String)>, StorageError>;

    fn write(&self, token: &str, identity_json: &str) -> Result<(), StorageError>;

    fn clear(&self) -> Result<(), StorageError>;
}

impl<S: SessionStorage + ?Sized> SessionStorage for std::sync::Arc<S> {
    fn read(&self) -> Result<Option<(String, String)>, StorageError> {
        (**self).read()
    }

    fn write(&self, token: &str, identity_json: &str) -> Result<(), StorageError> {
        (**self).write(token, identity_json)
    }

    fn clear(&self) -> Result<(), StorageError> {
        (**self).clear()
    }
}

/// Non-durable storage for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStorage {
    inner: RwLock<Option<(String, String)>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn read(&self) -> Result<Option<(String, String)>, StorageError> {
        let guard = self.inner.read().expect("rwlock poisoned");
        Ok(guard.clone())
    }

    fn write(&self, token: &str, identity_json: &str) -> Result<(), StorageError> {
        let mut guard = self.inner.write().expect("rwlock poisoned");
        *guard = Some((token.to_string(), identity_json.to_string()));
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut guard = self.inner.write().expect("rwlock poisoned");
        *guard = None;
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct FileRecord {
    token: String,
    identity: String,
}

/// JSON-file-backed storage, the durable analogue of browser local storage.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionStorage for FileStorage {
    fn read(&self) -> Result<Option<(String, String)>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StorageError::Backend(err.to_string())),
        };

        let record: FileRecord = serde_json::from_str(&raw)
            .map_err(|err| StorageError::Backend(format!("unreadable session file: {err}")))?;
        Ok(Some((record.token, record.identity)))
    }

    fn write(&self, token: &str, identity_json: &str) -> Result<(), StorageError> {
        let record = FileRecord {
            token: token.to_string(),
            identity: identity_json.to_string(),
        };
        let encoded = serde_json::to_string(&record)
            .map_err(|err| StorageError::Backend(err.to_string()))?;
        fs::write(&self.path, encoded).map_err(|err| StorageError::Backend(err.to_string()))
    }

    fn clear(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::Backend(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_round_trips_the_pair() {
        let storage = MemoryStorage::new();
        assert!(storage.read().expect("read").is_none());

        storage.write("tok", "{\"id\":1}").expect("write");
        let (token, identity) = storage.read().expect("read").expect("present");
        assert_eq!(token, "tok");
        assert_eq!(identity, "{\"id\":1}");

        storage.clear().expect("clear");
        assert!(storage.read().expect("read").is_none());
    }

    #[test]
    fn clearing_absent_state_is_not_an_error() {
        let storage = MemoryStorage::new();
        storage.clear().expect("clear empty");
        storage.clear().expect("clear twice");
    }
}
