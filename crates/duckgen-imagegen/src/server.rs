use std::sync::Arc;
use std::time::Duration;

use duckgen_config::ProviderConfig;
use duckgen_storage::BlobStore;
use reqwest::Client;
use url::Url;

use crate::{
    error::{ImageGenError, Result},
    http_client::build_http_client,
    image::GeneratedImage,
    persist::{MAX_IMAGE_BYTES, Persister},
    provider::{
        ImageGenProvider,
        google::{self, GoogleImageGenProvider},
        openai::{self, OpenAiImageGenProvider},
    },
    types::{GenerateResponse, GenerationRequest, Provider},
};

/// A provider together with the deadline applied to each of its calls
struct Upstream {
    provider: Box<dyn ImageGenProvider>,
    timeout: Duration,
}

impl Upstream {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        tokio::time::timeout(self.timeout, self.provider.generate(request))
            .await
            .map_err(|_| {
                tracing::warn!(provider = self.provider.name(), timeout = ?self.timeout, "upstream request timed out");
                ImageGenError::Timeout(self.timeout)
            })?
    }
}

/// Image generation server: dispatches to a provider and persists results
pub struct Server {
    openai: Upstream,
    google: Upstream,
    store: Option<Arc<dyn BlobStore>>,
    client: Client,
}

impl Server {
    /// Generate one image and, when a store is configured, keep a copy
    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerateResponse> {
        let upstream = self.upstream(request.provider);

        tracing::debug!(provider = %request.provider, model = %request.model, "dispatching image generation");

        let image = upstream.generate(&request).await?;

        let stored_key = match &self.store {
            Some(store) => {
                let persister = Persister {
                    store: store.as_ref(),
                    client: &self.client,
                    fetch_timeout: upstream.timeout,
                    max_bytes: MAX_IMAGE_BYTES,
                };
                persister.persist(&image, &request).await
            }
            None => None,
        };

        Ok(GenerateResponse {
            image_url: image.image_url(),
            stored_key,
        })
    }

    fn upstream(&self, provider: Provider) -> &Upstream {
        match provider {
            Provider::OpenAi => &self.openai,
            Provider::Google => &self.google,
        }
    }
}

/// Builder for constructing the image generation server from configuration
pub struct ImageGenServerBuilder<'a> {
    config: &'a duckgen_config::Config,
    store: Option<Arc<dyn BlobStore>>,
}

impl<'a> ImageGenServerBuilder<'a> {
    pub fn new(config: &'a duckgen_config::Config) -> Self {
        Self { config, store: None }
    }

    #[must_use]
    pub fn store(mut self, store: Option<Arc<dyn BlobStore>>) -> Self {
        self.store = store;
        self
    }

    pub fn build(self) -> anyhow::Result<Server> {
        let client = build_http_client()?;
        let providers = &self.config.providers;

        let openai = {
            let (base_url, timeout) = resolve("openai", &providers.openai, openai::DEFAULT_BASE_URL)?;
            Upstream {
                provider: Box::new(OpenAiImageGenProvider::new(client.clone(), base_url)),
                timeout,
            }
        };

        let google = {
            let (base_url, timeout) = resolve("google", &providers.google, google::DEFAULT_BASE_URL)?;
            Upstream {
                provider: Box::new(GoogleImageGenProvider::new(client.clone(), base_url)),
                timeout,
            }
        };

        if self.store.is_none() {
            tracing::debug!("No image store configured, generated images will not be persisted");
        }

        Ok(Server {
            openai,
            google,
            store: self.store,
            client,
        })
    }
}

fn resolve(name: &str, config: &ProviderConfig, default_base_url: &str) -> anyhow::Result<(Url, Duration)> {
    let base_url = match &config.base_url {
        Some(url) => url.clone(),
        None => Url::parse(default_base_url)?,
    };
    let timeout = config
        .timeout_duration()
        .map_err(|e| anyhow::anyhow!("providers.{name}.timeout: {e}"))?;

    tracing::debug!(provider = name, base_url = %base_url, ?timeout, "image generation provider configured");

    Ok((base_url, timeout))
}
