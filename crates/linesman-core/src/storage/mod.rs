//! Key/value storage abstraction for persistence.

mod memory;
mod migrate;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use memory::MemoryStorage;
pub use migrate::{
    CURRENT_VERSION, NodeRecord, PathRecord, PersistedPaths, decode_paths, encode_paths,
};

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Key not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Synchronous text key/value store.
///
/// Implementations can keep values in memory, on the filesystem, or in
/// any other backend that can hold strings.
pub trait Storage: Send + Sync {
    /// Load the value stored under `key`.
    fn load(&self, key: &str) -> StorageResult<String>;

    /// Store `value` under `key`, replacing any previous value.
    fn save(&self, key: &str, value: &str) -> StorageResult<()>;
}

/// Load and decode a JSON value, falling back to `default` when the key is
/// missing or unreadable.
pub fn load_or<T, S>(storage: &S, key: &str, default: T) -> T
where
    T: DeserializeOwned,
    S: Storage + ?Sized,
{
    match storage.load(key) {
        Ok(text) => match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Discarding unreadable value for {}: {}", key, e);
                default
            }
        },
        Err(StorageError::NotFound(_)) => default,
        Err(e) => {
            log::warn!("Failed to load {}: {}", key, e);
            default
        }
    }
}

/// Encode a value as JSON and store it.
pub fn save_json<T, S>(storage: &S, key: &str, value: &T) -> StorageResult<()>
where
    T: Serialize + ?Sized,
    S: Storage + ?Sized,
{
    let text = serde_json::to_string(value).map_err(|e| StorageError::Serialization(e.to_string()))?;
    storage.save(key, &text)
}
