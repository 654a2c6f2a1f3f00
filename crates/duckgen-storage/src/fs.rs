use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};

use crate::{BlobStore, ObjectEntry, PutOptions, StorageError, StoredObject};

/// Upper bound on the metadata line read while listing
const MAX_HEADER_LEN: u64 = 64 * 1024;

/// Directory-backed store
///
/// Each object is a single file named after its key: one line of JSON
/// metadata, a newline, then the body. Writes go to a uniquely named
/// temporary file that is renamed over the key, so readers see either the
/// previous object or the new one, never a mix of the two.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
    #[serde(default)]
    custom_metadata: BTreeMap<String, String>,
    uploaded_ms: i64,
    size: u64,
}

impl Header {
    fn uploaded(&self) -> Result<Timestamp, StorageError> {
        Timestamp::from_millisecond(self.uploaded_ms)
            .map_err(|e| StorageError::Serialization(format!("invalid upload time: {e}")))
    }
}

impl FsStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        if !is_valid_key(key) {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }
        Ok(self.root.join(key))
    }

    /// Read only the metadata line of an object file
    async fn read_header(&self, key: &str) -> Result<Option<Header>, StorageError> {
        let file = match tokio::fs::File::open(self.root.join(key)).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut line = Vec::new();
        BufReader::new(file.take(MAX_HEADER_LEN))
            .read_until(b'\n', &mut line)
            .await?;

        Ok(parse_header(key, &line))
    }
}

/// Keys map directly to file names, so anything that could escape the root
/// directory or collide with temporary files is refused
fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && !key.starts_with('.') && !key.contains(['/', '\\', '\0'])
}

/// Parse a metadata line; files that do not start with one are not objects
fn parse_header(key: &str, line: &[u8]) -> Option<Header> {
    let Some(line) = line.strip_suffix(b"\n") else {
        tracing::debug!(key, "ignoring file without object header");
        return None;
    };

    match serde_json::from_slice(line) {
        Ok(header) => Some(header),
        Err(e) => {
            tracing::warn!(key, error = %e, "ignoring file with unreadable object header");
            None
        }
    }
}

/// Split an object file into its header and body
fn decode_object(key: &str, mut raw: Vec<u8>) -> Option<(Header, Vec<u8>)> {
    let split = raw.iter().position(|&b| b == b'\n')? + 1;
    let header = parse_header(key, &raw[..split])?;
    let body = raw.split_off(split);
    Some((header, body))
}

/// Write header and body to a fresh temporary file and rename it over `path`
fn write_atomically(root: &Path, path: &Path, header: &[u8], body: &[u8]) -> Result<(), StorageError> {
    let mut tmp = tempfile::Builder::new()
        .prefix(".")
        .suffix(".tmp")
        .tempfile_in(root)?;

    tmp.write_all(header)?;
    tmp.write_all(b"\n")?;
    tmp.write_all(body)?;
    tmp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

#[async_trait]
impl BlobStore for FsStore {
    async fn list(&self) -> Result<Vec<ObjectEntry>, StorageError> {
        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.root).await?;

        while let Some(entry) = dir.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(key) = file_name.to_str().filter(|key| is_valid_key(key)) else {
                continue;
            };

            // A broken object hides itself instead of failing the listing
            let header = match self.read_header(key).await {
                Ok(Some(header)) => header,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(key, error = %e, "skipping unreadable object");
                    continue;
                }
            };

            match header.uploaded() {
                Ok(uploaded) => entries.push(ObjectEntry {
                    key: key.to_owned(),
                    uploaded,
                    size: header.size,
                    content_type: header.content_type,
                }),
                Err(e) => tracing::warn!(key, error = %e, "skipping object with invalid upload time"),
            }
        }

        Ok(entries)
    }

    async fn get(&self, key: &str) -> Result<Option<StoredObject>, StorageError> {
        let path = self.object_path(key)?;

        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let Some((header, bytes)) = decode_object(key, raw) else {
            return Ok(None);
        };

        Ok(Some(StoredObject {
            bytes,
            uploaded: header.uploaded()?,
            content_type: header.content_type,
            custom_metadata: header.custom_metadata,
        }))
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, options: PutOptions) -> Result<(), StorageError> {
        let path = self.object_path(key)?;
        let size = bytes.len();

        let header = Header {
            content_type: options.content_type,
            custom_metadata: options.custom_metadata,
            uploaded_ms: Timestamp::now().as_millisecond(),
            size: size as u64,
        };
        let header = serde_json::to_vec(&header).map_err(|e| StorageError::Serialization(e.to_string()))?;

        let root = self.root.clone();
        tokio::task::spawn_blocking(move || write_atomically(&root, &path, &header, &bytes))
            .await
            .map_err(|e| StorageError::Io(std::io::Error::other(e)))??;

        tracing::debug!(key, size, "stored object on disk");
        Ok(())
    }
}
