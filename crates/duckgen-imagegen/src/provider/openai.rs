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

/// Default `OpenAI` API base URL
pub(crate) const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const PROVIDER: &str = "openai";

/// Models that accept `response_format`; newer models reject the field and
/// answer with base64 instead
const URL_RESPONSE_MODELS: &[&str] = &["dall-e-2", "dall-e-3"];

/// `OpenAI` image generation provider
pub(crate) struct OpenAiImageGenProvider {
    client: Client,
    base_url: Url,
}

impl OpenAiImageGenProvider {
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    fn generations_url(&self) -> String {
        format!("{}/images/generations", self.base_url.as_str().trim_end_matches('/'))
    }
}

/// Wire format for the `OpenAI` image generation API request
#[derive(Debug, Serialize)]
struct OpenAiImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<&'static str>,
}

impl<'a> OpenAiImageRequest<'a> {
    fn new(model: &'a str, prompt: &'a str) -> Self {
        Self {
            model,
            prompt,
            n: 1,
            size: "1024x1024",
            response_format: URL_RESPONSE_MODELS.contains(&model).then_some("url"),
        }
    }
}

/// Wire format for the `OpenAI` image generation API response
#[derive(Debug, Deserialize)]
struct OpenAiImageResponse {
    #[serde(default)]
    data: Vec<OpenAiImageData>,
}

#[derive(Debug, Deserialize)]
struct OpenAiImageData {
    url: Option<String>,
    b64_json: Option<String>,
}

impl TryFrom<OpenAiImageResponse> for GeneratedImage {
    type Error = ImageGenError;

    fn try_from(response: OpenAiImageResponse) -> Result<Self> {
        let first = response.data.into_iter().next().ok_or_else(|| ImageGenError::UpstreamFormat {
            provider: PROVIDER,
            detail: "response contained no images".to_owned(),
        })?;

        match (first.url, first.b64_json) {
            (Some(url), _) if !url.is_empty() => Ok(Self::Url(url)),
            (_, Some(payload)) if !payload.is_empty() => Ok(Self::Inline(payload)),
            _ => Err(ImageGenError::UpstreamFormat {
                provider: PROVIDER,
                detail: "image entry has neither url nor b64_json".to_owned(),
            }),
        }
    }
}

#[async_trait]
impl ImageGenProvider for OpenAiImageGenProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        let wire_request = OpenAiImageRequest::new(&request.model, &request.prompt);

        tracing::debug!(
            provider = PROVIDER,
            model = %request.model,
            url_response = wire_request.response_format.is_some(),
            "sending image generation request"
        );

        let response = send(
            PROVIDER,
            self.client
                .post(self.generations_url())
                .bearer_auth(request.api_key.expose_secret())
                .json(&wire_request),
        )
        .await?;

        if !response.status().is_success() {
            return Err(upstream_error(PROVIDER, response, "OpenAI API error").await);
        }

        let wire_response: OpenAiImageResponse = parse_body(PROVIDER, response).await?;
        let image = GeneratedImage::try_from(wire_response)?;

        tracing::debug!(provider = PROVIDER, "image generation request complete");

        Ok(image)
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}
