//! Object storage for generated images
//!
//! The relay only needs three operations from its store: list everything,
//! read one object, write one object. [`BlobStore`] captures that contract;
//! [`MemoryStore`] and [`FsStore`] are the bundled backends.

#![allow(clippy::missing_errors_doc, clippy::must_use_candidate)]

mod error;
mod fs;
mod memory;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use duckgen_config::StorageConfig;
use jiff::Timestamp;

pub use error::StorageError;
pub use fs::FsStore;
pub use memory::MemoryStore;

/// Key/value object store with per-object metadata
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Every object currently in the store, in no particular order
    async fn list(&self) -> Result<Vec<ObjectEntry>, StorageError>;

    /// Read one object; `None` if the key does not exist
    async fn get(&self, key: &str) -> Result<Option<StoredObject>, StorageError>;

    /// Write one object, replacing any previous object under the same key
    async fn put(&self, key: &str, bytes: Vec<u8>, options: PutOptions) -> Result<(), StorageError>;
}

/// Listing entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub key: String,
    pub uploaded: Timestamp,
    pub size: u64,
    pub content_type: Option<String>,
}

/// Object body and metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub custom_metadata: BTreeMap<String, String>,
    pub uploaded: Timestamp,
}

/// Metadata attached on write
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutOptions {
    pub content_type: Option<String>,
    pub custom_metadata: BTreeMap<String, String>,
}

impl PutOptions {
    pub fn with_content_type(content_type: impl Into<String>) -> Self {
        Self {
            content_type: Some(content_type.into()),
            custom_metadata: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_metadata.insert(key.into(), value.into());
        self
    }
}

/// Build the configured store, or `None` when storage is not configured
pub async fn build_store(config: Option<&StorageConfig>) -> Result<Option<Arc<dyn BlobStore>>, StorageError> {
    let store: Arc<dyn BlobStore> = match config {
        None => {
            tracing::info!("no image store configured; generated images will not be persisted");
            return Ok(None);
        }
        Some(StorageConfig::Memory) => {
            tracing::info!("using in-memory image store");
            Arc::new(MemoryStore::new())
        }
        Some(StorageConfig::Filesystem(fs)) => {
            tracing::info!(path = %fs.path.display(), "using filesystem image store");
            Arc::new(FsStore::open(&fs.path).await?)
        }
    };

    Ok(Some(store))
}
