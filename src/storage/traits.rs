//! Abstract state store trait.
//!
//! The host keeps a chat-scoped key-value store next to the world document.
//! The engine reads shelter scope, health rates, rollover policy and debug
//! flags from it through a generic dotted-path lookup. Only the scope editor
//! ever writes.

use serde_json::Value;

use crate::error::StoreError;

/// Chat-scoped persisted key-value store.
///
/// Paths are dotted (`"eden.rules.health"`).
///
/// # Safety Considerations
/// - Implementations must be safe to share across threads
/// - A missing path is `Ok(None)`, never an error
pub trait StateStore: Send + Sync {
    /// Reads the value at `path`.
    fn get(&self, path: &str) -> Result<Option<Value>, StoreError>;

    /// Replaces the value at `path`, creating intermediate objects.
    fn set(&self, path: &str, value: Value) -> Result<(), StoreError>;

    /// Reads a boolean flag; anything but `true` reads as `false`.
    fn flag(&self, path: &str) -> Result<bool, StoreError> {
        Ok(matches!(self.get(path)?, Some(Value::Bool(true))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time test: ensure the trait is object-safe
    fn _assert_state_store_object_safe(_: &dyn StateStore) {}

    #[test]
    fn test_store_error_display() {
        let err = StoreError::InvalidPath(String::new());
        assert!(err.to_string().contains("Invalid store path"));

        let err = StoreError::Backend("poisoned lock".to_string());
        assert!(err.to_string().contains("poisoned lock"));
    }
}
