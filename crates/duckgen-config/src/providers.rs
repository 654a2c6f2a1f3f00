use std::time::Duration;

use serde::Deserialize;
use url::Url;

/// Upstream image generation endpoints
///
/// Credentials are not configured here: every generate request carries the
/// caller's own API key.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProvidersConfig {
    /// OpenAI-compatible image API
    #[serde(default)]
    pub openai: ProviderConfig,
    /// Google Generative Language image API
    #[serde(default)]
    pub google: ProviderConfig,
}

/// Settings for a single upstream provider
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Base URL override; the provider default is used when unset
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Upper bound for one upstream call, e.g. "180s" or "3m"
    #[serde(default = "default_timeout")]
    pub timeout: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: default_timeout(),
        }
    }
}

impl ProviderConfig {
    /// Parse the configured timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout is not a valid duration or is zero
    pub fn timeout_duration(&self) -> anyhow::Result<Duration> {
        let timeout = duration_str::parse(&self.timeout)
            .map_err(|e| anyhow::anyhow!("invalid duration '{}': {e}", self.timeout))?;

        if timeout.is_zero() {
            anyhow::bail!("timeout must be greater than zero");
        }

        Ok(timeout)
    }
}

fn default_timeout() -> String {
    "180s".to_owned()
}
