//! Object storage for signature artifacts.
//!
//! The signing flow only depends on the [`ObjectStore`] contract. Writes are
//! not transactional with the database; an upload whose metadata commit later
//! fails leaves an orphaned object behind.

use async_trait::async_trait;

use crate::error::StorageError;

pub mod filesystem;
pub mod memory;

pub use filesystem::FileObjectStore;
pub use memory::MemoryObjectStore;

/// Object key under which an estimate's signature is stored.
pub fn signature_key(estimate_id: i64) -> String {
    format!("signatures/{}.png", estimate_id)
}

/// A fetched object with its recorded metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub content: Vec<u8>,
    pub content_type: String,
    pub size: u64,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `content` under `key`, replacing any existing object.
    async fn upload(&self, key: &str, content: &[u8], content_type: &str)
        -> Result<(), StorageError>;

    /// Fetches the object under `key`, or `StorageError::NotFound`.
    async fn fetch(&self, key: &str) -> Result<StoredObject, StorageError>;
}

/// Checks that a key is a relative, slash-separated path of plain segments.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key.split('/').all(|segment| {
            !segment.is_empty()
                && segment != "."
                && segment != ".."
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        });

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}
