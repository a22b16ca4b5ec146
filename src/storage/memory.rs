//! In-memory state store.
//!
//! Thread-safe `StateStore` over a single JSON tree. Used by tests, the
//! benchmark, and hosts that mirror their chat variables into memory before
//! each pass.

use std::sync::RwLock;

use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::storage::traits::StateStore;
use crate::value::{get_path, set_path, split_path};

fn lock_err(context: &'static str) -> StoreError {
    StoreError::Backend(format!("poisoned lock: {context}"))
}

fn checked_path(path: &str) -> Result<&str, StoreError> {
    if split_path(path).is_empty() {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(path)
}

/// In-memory `StateStore`.
#[derive(Debug)]
pub struct InMemoryStateStore {
    root: RwLock<Value>,
}

impl Default for InMemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: RwLock::new(Value::Object(Map::new())),
        }
    }

    /// Creates a store seeded with an existing tree.
    #[must_use]
    pub fn from_value(root: Value) -> Self {
        Self {
            root: RwLock::new(root),
        }
    }

    /// Creates a store from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialization` if the text is not valid JSON.
    pub fn from_json_str(json: &str) -> Result<Self, StoreError> {
        Ok(Self::from_value(serde_json::from_str(json)?))
    }

    /// Returns a copy of the whole tree.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backend` if the lock is poisoned.
    pub fn snapshot(&self) -> Result<Value, StoreError> {
        let root = self.root.read().map_err(|_| lock_err("snapshot"))?;
        Ok(root.clone())
    }
}

impl StateStore for InMemoryStateStore {
    fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let path = checked_path(path)?;
        let root = self.root.read().map_err(|_| lock_err("get"))?;
        Ok(get_path(&root, path).cloned())
    }

    fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let path = checked_path(path)?;
        let mut root = self.root.write().map_err(|_| lock_err("set"))?;
        if !set_path(&mut root, path, value) {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        Ok(())
    }
}
