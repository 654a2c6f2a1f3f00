//! Feed of recently generated images and raw access to stored objects

#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions
)]

mod error;
mod feed;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};
use duckgen_storage::BlobStore;
use feed::DEFAULT_CONTENT_TYPE;

pub use error::FeedError;
pub use feed::{FEED_LIMIT, Feed, FeedDebug, FeedResponse};

/// Stored objects never change once written
const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Build the feed from configuration
///
/// # Errors
///
/// Returns an error if the feed configuration is inconsistent
pub fn build_feed(config: &duckgen_config::Config, store: Option<Arc<dyn BlobStore>>) -> anyhow::Result<Arc<Feed>> {
    let feed = Feed::new(&config.feed, store).map_err(|e| anyhow::anyhow!("Failed to initialize feed: {e}"))?;
    Ok(Arc::new(feed))
}

/// Router for `GET /api/feed`
pub fn feed_router() -> Router<Arc<Feed>> {
    Router::new().route("/api/feed", get(latest))
}

/// Router for `GET /images/{key}`
pub fn images_router() -> Router<Arc<Feed>> {
    Router::new().route("/images/{key}", get(image))
}

async fn latest(State(feed): State<Arc<Feed>>) -> Json<FeedResponse> {
    Json(feed.latest().await)
}

async fn image(State(feed): State<Arc<Feed>>, Path(key): Path<String>) -> Result<Response, FeedError> {
    let object = feed.image(&key).await?;
    let content_type = object.content_type.unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_owned());

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, IMMUTABLE_CACHE_CONTROL.to_owned()),
        ],
        object.bytes,
    )
        .into_response())
}
