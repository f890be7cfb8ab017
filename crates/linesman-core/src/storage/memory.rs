//! In-memory storage implementation.

use super::{Storage, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryStorage {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.values.read().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Storage for MemoryStorage {
    fn load(&self, key: &str) -> StorageResult<String> {
        let values = self
            .values
            .read()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
        values
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    fn save(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut values = self
            .values
            .write()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
