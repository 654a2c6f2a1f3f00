//! Provider-neutral image reference

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};

/// MIME type assumed for every generated image
pub const IMAGE_CONTENT_TYPE: &str = "image/png";

/// What a provider handed back, before it is turned into a client URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedImage {
    /// Image hosted by the provider
    Url(String),
    /// Base64-encoded PNG bytes
    Inline(String),
}

impl GeneratedImage {
    /// Value returned to the client as `imageUrl`
    pub fn image_url(&self) -> String {
        match self {
            Self::Url(url) => url.clone(),
            Self::Inline(payload) => data_uri(IMAGE_CONTENT_TYPE, payload),
        }
    }
}

/// Build `data:<content_type>;base64,<payload>`
pub fn data_uri(content_type: &str, payload: &str) -> String {
    format!("data:{content_type};base64,{payload}")
}

/// Decode an inline base64 payload
pub fn decode_payload(payload: &str) -> Result<Vec<u8>, base64::DecodeError> {
    BASE64.decode(payload.trim())
}
