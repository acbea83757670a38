//! Port for durable client storage (browser local storage or equivalent).
//!
//! Each storage key has exactly one owning component; nothing else may read
//! or write it directly. That rule keeps the in-memory stores and the
//! persisted values from drifting apart between reads.

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

/// Errors raised by client storage adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientStorageError {
    /// The underlying store rejected the read or write.
    #[error("client storage access failed: {message}")]
    Access {
        /// Adapter-supplied failure description.
        message: String,
    },
}

impl ClientStorageError {
    /// Convenience constructor for [`ClientStorageError::Access`].
    pub fn access(message: impl Into<String>) -> Self {
        Self::Access {
            message: message.into(),
        }
    }
}

/// Port for string key/value persistence.
///
/// Operations are synchronous by contract: the theme store relies on
/// `write` having completed before it returns, so a reload observes the new
/// value before first paint.
#[cfg_attr(test, mockall::automock)]
pub trait ClientStorage: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    fn read(&self, key: &str) -> Result<Option<String>, ClientStorageError>;

    /// Store `value` under `key`, replacing any prior value.
    fn write(&self, key: &str, value: &str) -> Result<(), ClientStorageError>;

    /// Delete the value stored under `key`. Deleting an absent key is not
    /// an error.
    fn remove(&self, key: &str) -> Result<(), ClientStorageError>;
}

/// In-memory adapter for tests and development shells.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClientStorage for InMemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, ClientStorageError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| ClientStorageError::access("storage mutex poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), ClientStorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| ClientStorageError::access("storage mutex poisoned"))?;
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ClientStorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| ClientStorageError::access("storage mutex poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}
