use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{ImageGenProvider, parse_body, send, upstream_error};
use crate::{
    error::{ImageGenError, Result},
    image::GeneratedImage,
    types::GenerationRequest,
};

/// Default Google Generative Language API base URL
pub(crate) const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const PROVIDER: &str = "google";

/// Google image generation provider
///
/// The caller's key travels as the `key` query parameter, so request URLs
/// must never reach logs or error messages.
pub(crate) struct GoogleImageGenProvider {
    client: Client,
    base_url: Url,
}

impl GoogleImageGenProvider {
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// Build the `generateImages` endpoint URL for a model, without the key
    ///
    /// The model is pushed as a single path segment, so `/`, `?` and `#`
    /// in it are percent-encoded rather than changing the endpoint.
    fn generate_url(&self, model: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow::anyhow!("google base URL cannot carry a path: {}", self.base_url))?
            .pop_if_empty()
            .push("models")
            .push(&format!("{model}:generateImages"));
        Ok(url)
    }
}

#[derive(Debug, Serialize)]
struct GoogleImageRequest<'a> {
    prompt: &'a str,
    number_of_images: u32,
}

#[derive(Debug, Deserialize)]
struct GoogleImageResponse {
    #[serde(default)]
    generated_images: Vec<GoogleGeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GoogleGeneratedImage {
    image: Option<GoogleImage>,
}

#[derive(Debug, Deserialize)]
struct GoogleImage {
    image_bytes: Option<String>,
}

impl TryFrom<GoogleImageResponse> for GeneratedImage {
    type Error = ImageGenError;

    fn try_from(response: GoogleImageResponse) -> Result<Self> {
        response
            .generated_images
            .into_iter()
            .next()
            .and_then(|generated| generated.image)
            .and_then(|image| image.image_bytes)
            .filter(|payload| !payload.is_empty())
            .map(Self::Inline)
            .ok_or_else(|| ImageGenError::UpstreamFormat {
                provider: PROVIDER,
                detail: "generated_images[0].image.image_bytes missing".to_owned(),
            })
    }
}

#[async_trait]
impl ImageGenProvider for GoogleImageGenProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        let wire_request = GoogleImageRequest {
            prompt: &request.prompt,
            number_of_images: 1,
        };

        tracing::debug!(provider = PROVIDER, model = %request.model, "sending image generation request");

        let response = send(
            PROVIDER,
            self.client
                .post(self.generate_url(&request.model)?)
                .query(&[("key", request.api_key.expose_secret())])
                .json(&wire_request),
        )
        .await?;

        if !response.status().is_success() {
            return Err(upstream_error(PROVIDER, response, "Google API error").await);
        }

        let wire_response: GoogleImageResponse = parse_body(PROVIDER, response).await?;
        let image = GeneratedImage::try_from(wire_response)?;

        tracing::debug!(provider = PROVIDER, "image generation request complete");

        Ok(image)
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}
