use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use duckgen_config::{FeedConfig, FeedMode};
use duckgen_storage::{BlobStore, ObjectEntry, StorageError, StoredObject};
use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::error::FeedError;

/// Number of images returned by the feed
pub const FEED_LIMIT: usize = 20;

/// Concurrent object reads while rendering an inline feed
const INLINE_FETCH_CONCURRENCY: usize = 8;

/// Content type assumed for objects stored without one
pub(crate) const DEFAULT_CONTENT_TYPE: &str = "image/png";

/// How feed entries are rendered; fixed for the lifetime of a deployment
#[derive(Debug, Clone, PartialEq, Eq)]
enum Rendering {
    Inline,
    Link { base_url: String },
}

/// Body of `GET /api/feed`
#[derive(Debug, Default, Serialize)]
pub struct FeedResponse {
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<FeedDebug>,
}

#[derive(Debug, Serialize)]
pub struct FeedDebug {
    pub message: String,
}

impl FeedResponse {
    fn without_store() -> Self {
        Self {
            images: Vec::new(),
            debug: cfg!(debug_assertions).then(|| FeedDebug {
                message: "No image store configured".to_owned(),
            }),
        }
    }
}

/// Read side of the image store
pub struct Feed {
    store: Option<Arc<dyn BlobStore>>,
    rendering: Rendering,
}

impl Feed {
    /// Build the feed for the configured rendering mode
    ///
    /// # Errors
    ///
    /// Returns an error if link mode is selected without a public base URL
    pub fn new(config: &FeedConfig, store: Option<Arc<dyn BlobStore>>) -> anyhow::Result<Self> {
        let rendering = match config.mode {
            FeedMode::Inline => Rendering::Inline,
            FeedMode::Link => {
                let base_url = config
                    .public_base_url
                    .as_ref()
                    .ok_or_else(|| anyhow::anyhow!("feed.public_base_url is required when feed.mode = \"link\""))?;
                Rendering::Link {
                    base_url: base_url.as_str().trim_end_matches('/').to_owned(),
                }
            }
        };

        tracing::debug!(?rendering, "feed initialized");

        Ok(Self { store, rendering })
    }

    /// The newest stored images, newest first
    ///
    /// Storage failures degrade to an empty list.
    pub async fn latest(&self) -> FeedResponse {
        let Some(store) = &self.store else {
            return FeedResponse::without_store();
        };

        let mut entries = match store.list().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!(error = %e, "failed to list stored images");
                return FeedResponse::default();
            }
        };

        newest_first(&mut entries);
        entries.truncate(FEED_LIMIT);

        let images = match &self.rendering {
            Rendering::Link { base_url } => entries
                .iter()
                .map(|entry| format!("{base_url}/{}", entry.key))
                .collect(),
            Rendering::Inline => inline(store.as_ref(), &entries).await,
        };

        tracing::debug!(count = images.len(), "feed rendered");

        FeedResponse { images, debug: None }
    }

    /// Read a single stored image
    pub async fn image(&self, key: &str) -> Result<StoredObject, FeedError> {
        let store = self.store.as_ref().ok_or_else(|| FeedError::NotFound(key.to_owned()))?;

        match store.get(key).await {
            Ok(Some(object)) => Ok(object),
            Ok(None) | Err(StorageError::InvalidKey(_)) => Err(FeedError::NotFound(key.to_owned())),
            Err(e) => Err(e.into()),
        }
    }
}

/// Sort by upload time descending, ties by key descending
fn newest_first(entries: &mut [ObjectEntry]) {
    entries.sort_by(|a, b| b.uploaded.cmp(&a.uploaded).then_with(|| b.key.cmp(&a.key)));
}

/// Fetch entries concurrently and encode each as a data URI, keeping order
async fn inline(store: &dyn BlobStore, entries: &[ObjectEntry]) -> Vec<String> {
    let fetches: Vec<_> = entries
        .iter()
        .map(|entry| async move {
            match store.get(&entry.key).await {
                Ok(Some(object)) => Some(encode(&object)),
                Ok(None) => {
                    tracing::debug!(key = %entry.key, "stored image vanished before it could be read");
                    None
                }
                Err(e) => {
                    tracing::warn!(key = %entry.key, error = %e, "failed to read stored image");
                    None
                }
            }
        })
        .collect();

    stream::iter(fetches)
        .buffered(INLINE_FETCH_CONCURRENCY)
        .filter_map(std::future::ready)
        .collect()
        .await
}

fn encode(object: &StoredObject) -> String {
    let content_type = object.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE);
    format!("data:{content_type};base64,{}", BASE64.encode(&object.bytes))
}
