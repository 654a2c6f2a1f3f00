use std::path::PathBuf;

use serde::Deserialize;

/// Image store backend
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageConfig {
    /// In-process store, lost on restart
    Memory,
    /// Objects and their metadata as files under a directory
    Filesystem(FilesystemStorageConfig),
}

/// Filesystem store configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilesystemStorageConfig {
    /// Directory holding the objects; created on startup if missing
    pub path: PathBuf,
}
