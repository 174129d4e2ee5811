//! Persistence backends for the serialized session collection.

pub mod json_backend;
pub mod ledger_store;

use std::{collections::HashMap, sync::RwLock};

use crate::errors::{Result, TinError};

/// A keyed blob store. Implementations must replace a key's contents in a
/// single write so readers never observe a partial collection.
pub trait StorageBackend: Send + Sync {
    /// Returns `Ok(None)` when nothing has been stored under `key` yet.
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&self, key: &str, data: &str) -> Result<()>;
}

/// In-process backend, useful for embedding hosts and tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    blobs: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds `key` with raw contents, bypassing serialization.
    pub fn with_blob(key: impl Into<String>, data: impl Into<String>) -> Self {
        let storage = Self::default();
        if let Ok(mut blobs) = storage.blobs.write() {
            blobs.insert(key.into(), data.into());
        }
        storage
    }
}

impl StorageBackend for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let blobs = self
            .blobs
            .read()
            .map_err(|_| TinError::PersistenceFailure("memory storage poisoned".into()))?;
        Ok(blobs.get(key).cloned())
    }

    fn write(&self, key: &str, data: &str) -> Result<()> {
        let mut blobs = self
            .blobs
            .write()
            .map_err(|_| TinError::PersistenceFailure("memory storage poisoned".into()))?;
        blobs.insert(key.to_string(), data.to_string());
        Ok(())
    }
}

impl<T: StorageBackend + ?Sized> StorageBackend for std::sync::Arc<T> {
    fn read(&self, key: &str) -> Result<Option<String>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, data: &str) -> Result<()> {
        (**self).write(key, data)
    }
}

pub use json_backend::JsonStorage;
pub use ledger_store::{
    insert, remove, select_initial_active, upsert, LedgerStore, DEFAULT_STORE_KEY,
};
