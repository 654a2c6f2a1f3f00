use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::ImageGenError;

/// Upstream image generation API family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    /// OpenAI-compatible `images/generations`
    OpenAi,
    /// Google Generative Language `generateImages`
    Google,
}

impl Provider {
    /// Wire name used in requests and stored metadata
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Google => "google",
        }
    }

    /// Parse a wire name; matching is exact
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "openai" => Some(Self::OpenAi),
            "google" => Some(Self::Google),
            _ => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /api/generate` as sent by the client
///
/// Every field is optional here so that a missing field is reported as a
/// validation error rather than a deserialization failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub api_key: Option<SecretString>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
}

/// A validated generate request
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Caller's own provider credential, forwarded verbatim
    pub api_key: SecretString,
    pub provider: Provider,
    pub model: String,
    pub prompt: String,
}

impl TryFrom<GenerateRequest> for GenerationRequest {
    type Error = ImageGenError;

    fn try_from(request: GenerateRequest) -> Result<Self, Self::Error> {
        let api_key = request.api_key.filter(|key| !key.expose_secret().is_empty());
        let provider = request.provider.filter(|p| !p.is_empty());
        let model = request.model.filter(|m| !m.is_empty());
        let prompt = request.prompt.filter(|p| !p.is_empty());

        let (Some(api_key), Some(provider), Some(model), Some(prompt)) = (api_key, provider, model, prompt) else {
            return Err(ImageGenError::Validation("Missing required fields".to_owned()));
        };

        let provider =
            Provider::parse(&provider).ok_or_else(|| ImageGenError::Validation("Invalid provider".to_owned()))?;

        Ok(Self {
            api_key,
            provider,
            model,
            prompt,
        })
    }
}

/// Body of a successful `POST /api/generate` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    /// Direct image URL or `data:image/png;base64,...` URI
    pub image_url: String,
    /// Store key, present only when the image was persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_key: Option<String>,
}
