pub(crate) mod google;
pub(crate) mod openai;

use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    error::{ImageGenError, Result},
    image::GeneratedImage,
    types::GenerationRequest,
};

/// Trait for upstream image generation APIs
///
/// Implementations keep their wire types private and return a
/// [`GeneratedImage`], so provider field names never leave the module.
#[async_trait]
pub(crate) trait ImageGenProvider: Send + Sync {
    /// Generate one image for the request
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage>;

    /// Provider name for logs
    fn name(&self) -> &'static str;
}

/// Error envelope shared by both upstream APIs: `{"error": {"message": ...}}`
#[derive(Deserialize)]
struct UpstreamErrorBody {
    error: Option<UpstreamErrorDetail>,
}

#[derive(Deserialize)]
struct UpstreamErrorDetail {
    message: Option<String>,
}

/// Send a request, mapping transport failures to [`ImageGenError::Connection`]
///
/// The URL is stripped from reqwest errors before they are logged or kept,
/// since it may carry the caller's key.
async fn send(provider: &'static str, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
    request.send().await.map_err(|e| {
        let e = e.without_url();
        tracing::error!(provider, error = %e, "image generation request failed");
        ImageGenError::Connection(e.to_string())
    })
}

/// Turn a non-success upstream response into [`ImageGenError::Upstream`]
///
/// The upstream status is kept; the message is the upstream's own
/// `error.message` when present, otherwise `fallback`.
async fn upstream_error(provider: &'static str, response: reqwest::Response, fallback: &str) -> ImageGenError {
    let status = response.status();

    let message = response
        .json::<UpstreamErrorBody>()
        .await
        .ok()
        .and_then(|body| body.error)
        .and_then(|detail| detail.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| fallback.to_owned());

    tracing::warn!(provider, %status, upstream_message = %message, "upstream returned error");

    ImageGenError::Upstream { status, message }
}

/// Parse a success body, mapping decode failures to
/// [`ImageGenError::UpstreamFormat`]
async fn parse_body<T: serde::de::DeserializeOwned>(provider: &'static str, response: reqwest::Response) -> Result<T> {
    response.json::<T>().await.map_err(|e| ImageGenError::UpstreamFormat {
        provider,
        detail: e.without_url().to_string(),
    })
}
