//! Best-effort copy of generated images into the image store

use std::time::Duration;

use duckgen_storage::{BlobStore, PutOptions, StorageError};
use jiff::Timestamp;
use reqwest::Client;
use thiserror::Error;

use crate::image::{GeneratedImage, IMAGE_CONTENT_TYPE, decode_payload};
use crate::types::GenerationRequest;

/// Largest upstream image body copied into the store
pub(crate) const MAX_IMAGE_BYTES: usize = 32 * 1024 * 1024;

/// Why an image could not be stored; never reaches the client
#[derive(Debug, Error)]
enum PersistError {
    #[error("invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("image download failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("image download returned {0}")]
    FetchStatus(reqwest::StatusCode),

    #[error("image download timed out after {0:?}")]
    FetchTimeout(Duration),

    #[error("image download exceeds {0} bytes")]
    TooLarge(usize),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Everything needed to copy one image into the store
pub(crate) struct Persister<'a> {
    pub store: &'a dyn BlobStore,
    pub client: &'a Client,
    pub fetch_timeout: Duration,
    pub max_bytes: usize,
}

impl Persister<'_> {
    /// Attempt to store the image, returning its key on success
    ///
    /// Failures are logged and swallowed.
    pub async fn persist(&self, image: &GeneratedImage, request: &GenerationRequest) -> Option<String> {
        match self.try_persist(image, request).await {
            Ok(key) => {
                tracing::info!(key = %key, provider = %request.provider, "image stored");
                Some(key)
            }
            Err(e) => {
                tracing::error!(error = %e, provider = %request.provider, "failed to store generated image");
                None
            }
        }
    }

    async fn try_persist(&self, image: &GeneratedImage, request: &GenerationRequest) -> Result<String, PersistError> {
        let bytes = match image {
            GeneratedImage::Inline(payload) => decode_payload(payload)?,
            GeneratedImage::Url(url) => self.download(url).await?,
        };

        let now = Timestamp::now();
        let key = object_key(now);
        let options = PutOptions::with_content_type(IMAGE_CONTENT_TYPE)
            .metadata("prompt", request.prompt.as_str())
            .metadata("provider", request.provider.as_str())
            .metadata("model", request.model.as_str())
            .metadata("generatedAt", now.to_string());

        self.store.put(&key, bytes, options).await?;

        Ok(key)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, PersistError> {
        tracing::debug!("downloading generated image");

        let fetch = async {
            let mut response = self.client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(PersistError::FetchStatus(status));
            }

            let within_limit = |len: u64| usize::try_from(len).is_ok_and(|len| len <= self.max_bytes);
            if response.content_length().is_some_and(|len| !within_limit(len)) {
                return Err(PersistError::TooLarge(self.max_bytes));
            }

            let mut body = Vec::new();
            while let Some(chunk) = response.chunk().await? {
                if body.len() + chunk.len() > self.max_bytes {
                    return Err(PersistError::TooLarge(self.max_bytes));
                }
                body.extend_from_slice(&chunk);
            }
            Ok::<_, PersistError>(body)
        };

        tokio::time::timeout(self.fetch_timeout, fetch)
            .await
            .map_err(|_| PersistError::FetchTimeout(self.fetch_timeout))?
    }
}

/// `duck-<unix millis>.png`
pub(crate) fn object_key(now: Timestamp) -> String {
    format!("duck-{}.png", now.as_millisecond())
}
