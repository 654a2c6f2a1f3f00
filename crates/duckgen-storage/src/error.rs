use thiserror::Error;

/// Image store errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Key cannot be stored by this backend
    #[error("invalid object key: {0:?}")]
    InvalidKey(String),

    /// Filesystem failure
    #[error("storage I/O: {0}")]
    Io(#[from] std::io::Error),

    /// Metadata could not be encoded or decoded
    #[error("storage metadata: {0}")]
    Serialization(String),

    /// Store is reachable but refused the operation
    #[error("storage backend: {0}")]
    Backend(String),
}
