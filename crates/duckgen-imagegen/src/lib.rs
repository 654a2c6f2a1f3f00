#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions
)]

mod error;
mod http_client;
mod image;
mod persist;
mod provider;
mod server;
mod types;

use std::sync::Arc;

use axum::{Json, Router, body::Bytes, extract::State, routing::post};
use duckgen_storage::BlobStore;

pub use error::{ImageGenError, Result};
pub use types::{GenerateRequest, GenerateResponse, GenerationRequest, Provider};

pub use server::Server;
use server::ImageGenServerBuilder;

/// Build the image generation server from configuration
///
/// # Errors
///
/// Returns an error if the server fails to initialize
pub fn build_server(config: &duckgen_config::Config, store: Option<Arc<dyn BlobStore>>) -> anyhow::Result<Arc<Server>> {
    let server = ImageGenServerBuilder::new(config)
        .store(store)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to initialize image generation server: {e}"))?;

    Ok(Arc::new(server))
}

/// Create the endpoint router for image generation
pub fn endpoint_router() -> Router<Arc<Server>> {
    Router::new().route("/api/generate", post(generate))
}

/// Handle image generation requests
///
/// The body is parsed as JSON whatever its `Content-Type`, so clients that
/// omit the header are still served.
async fn generate(State(server): State<Arc<Server>>, body: Bytes) -> Result<Json<GenerateResponse>> {
    let request: GenerateRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!(error = %e, "rejected generate request body");
        ImageGenError::Validation("Invalid JSON body".to_owned())
    })?;

    let request = GenerationRequest::try_from(request)?;

    tracing::debug!(provider = %request.provider, model = %request.model, "Image generation handler called");

    let response = server.generate(request).await?;

    tracing::debug!(stored = response.stored_key.is_some(), "Image generation complete");

    Ok(Json(response))
}
