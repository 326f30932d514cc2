//! Durable key-value storage port.
//!
//! Persistence is kept out of the store's transition logic: the engine talks
//! to a [`Storage`] trait object, and the actual write happens in an ordinary
//! state-stream subscriber installed by
//! [`StoreBuilder::persisted`](crate::StoreBuilder::persisted). Core logic is
//! therefore fully testable without any backend; tests use the in-memory
//! implementation from `storelet-testing`.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// An underlying I/O failure.
    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),

    /// A backend-specific failure.
    #[error("storage backend: {0}")]
    Backend(String),
}

/// A durable key-value store of serialized state snapshots.
///
/// One entry per store: key = the store's fixed storage identifier, value =
/// the JSON-serialized state. Implementations must be safe to call from the
/// notification path of a store; failures are reported, never retried.
pub trait Storage: Send + Sync {
    /// Read the value last saved under `key`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be read.
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Durably write `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be written.
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// File-backed [`Storage`]: one `{key}.json` file per entry under a
/// directory. The local-storage analogue for a desktop process.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create a storage rooted at `dir`. The directory is created lazily on
    /// first save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path(key), value)?;
        Ok(())
    }
}
