//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;
use std::path::Path;

use duckgen_config::{
    Config, CorsConfig, FeedMode, FilesystemStorageConfig, ProviderConfig, ServerConfig, StorageConfig,
};

use super::mock_provider::MockProvider;

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with minimal defaults
    pub fn new() -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    ..ServerConfig::default()
                },
                ..Config::default()
            },
        }
    }

    /// Point both providers at a mock backend
    pub fn with_mock(mut self, mock: &MockProvider) -> Self {
        self.config.providers.openai = ProviderConfig {
            base_url: Some(mock.openai_base_url().parse().unwrap()),
            ..ProviderConfig::default()
        };
        self.config.providers.google = ProviderConfig {
            base_url: Some(mock.google_base_url().parse().unwrap()),
            ..ProviderConfig::default()
        };
        self
    }

    /// Point both providers at an address nothing listens on
    pub fn with_unreachable_providers(mut self, addr: SocketAddr) -> Self {
        let base_url = format!("http://{addr}/v1");
        self.config.providers.openai.base_url = Some(base_url.parse().unwrap());
        self.config.providers.google.base_url = Some(base_url.parse().unwrap());
        self
    }

    /// Set the per-call timeout of both providers, e.g. "200ms"
    pub fn with_timeout(mut self, timeout: &str) -> Self {
        self.config.providers.openai.timeout = timeout.to_owned();
        self.config.providers.google.timeout = timeout.to_owned();
        self
    }

    /// Use the in-memory store
    pub fn with_memory_storage(mut self) -> Self {
        self.config.storage = Some(StorageConfig::Memory);
        self
    }

    /// Use the filesystem store rooted at `path`
    pub fn with_filesystem_storage(mut self, path: &Path) -> Self {
        self.config.storage = Some(StorageConfig::Filesystem(FilesystemStorageConfig {
            path: path.to_path_buf(),
        }));
        self
    }

    /// Render the feed as links under `base_url`
    pub fn with_feed_links(mut self, base_url: &str) -> Self {
        self.config.feed.mode = FeedMode::Link;
        self.config.feed.public_base_url = Some(base_url.parse().unwrap());
        self
    }

    /// Set CORS configuration
    pub fn with_cors(mut self, config: CorsConfig) -> Self {
        self.config.server.cors = config;
        self
    }

    /// Move the health endpoint
    pub fn with_health_path(mut self, path: &str) -> Self {
        self.config.server.health.path = path.to_owned();
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
