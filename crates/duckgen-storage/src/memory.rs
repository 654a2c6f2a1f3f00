use std::collections::BTreeMap;

use async_trait::async_trait;
use jiff::Timestamp;
use tokio::sync::RwLock;

use crate::{BlobStore, ObjectEntry, PutOptions, StorageError, StoredObject};

/// In-process store, mainly for tests and throwaway deployments
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write an object with an explicit upload time
    pub async fn put_at(&self, key: &str, bytes: Vec<u8>, options: PutOptions, uploaded: Timestamp) {
        let object = StoredObject {
            bytes,
            content_type: options.content_type,
            custom_metadata: options.custom_metadata,
            uploaded,
        };

        self.objects.write().await.insert(key.to_owned(), object);
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn list(&self) -> Result<Vec<ObjectEntry>, StorageError> {
        let objects = self.objects.read().await;

        Ok(objects
            .iter()
            .map(|(key, object)| ObjectEntry {
                key: key.clone(),
                uploaded: object.uploaded,
                size: object.bytes.len() as u64,
                content_type: object.content_type.clone(),
            })
            .collect())
    }

    async fn get(&self, key: &str) -> Result<Option<StoredObject>, StorageError> {
        Ok(self.objects.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, options: PutOptions) -> Result<(), StorageError> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }

        self.put_at(key, bytes, options, Timestamp::now()).await;
        tracing::debug!(key, "stored object in memory");
        Ok(())
    }
}
