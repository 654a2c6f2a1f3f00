#![allow(clippy::must_use_candidate)]

pub mod cors;
mod env;
pub mod feed;
pub mod health;
mod loader;
pub mod logging;
pub mod providers;
pub mod server;
pub mod storage;

use serde::Deserialize;

pub use cors::*;
pub use feed::*;
pub use health::*;
pub use logging::*;
pub use providers::*;
pub use server::*;
pub use storage::*;

/// Top-level duckgen configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream image generation providers
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Image store; generated images are not persisted when absent
    #[serde(default)]
    pub storage: Option<StorageConfig>,
    /// Feed rendering
    #[serde(default)]
    pub feed: FeedConfig,
    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}
