//! Store doubles

use async_trait::async_trait;
use duckgen_storage::{BlobStore, ObjectEntry, PutOptions, StorageError, StoredObject};

/// A store whose every operation fails
pub struct FailingStore;

#[async_trait]
impl BlobStore for FailingStore {
    async fn list(&self) -> Result<Vec<ObjectEntry>, StorageError> {
        Err(StorageError::Backend("bucket unavailable".to_owned()))
    }

    async fn get(&self, _key: &str) -> Result<Option<StoredObject>, StorageError> {
        Err(StorageError::Backend("bucket unavailable".to_owned()))
    }

    async fn put(&self, _key: &str, _bytes: Vec<u8>, _options: PutOptions) -> Result<(), StorageError> {
        Err(StorageError::Backend("bucket unavailable".to_owned()))
    }
}

/// True for keys shaped like `duck-<unix millis>.png`
pub fn is_duck_key(key: &str) -> bool {
    key.strip_prefix("duck-")
        .and_then(|rest| rest.strip_suffix(".png"))
        .is_some_and(|millis| !millis.is_empty() && millis.bytes().all(|b| b.is_ascii_digit()))
}
