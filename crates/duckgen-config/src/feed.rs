use serde::Deserialize;
use url::Url;

/// Feed rendering configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeedConfig {
    /// How stored images are returned to clients
    #[serde(default)]
    pub mode: FeedMode,
    /// Public address the stored objects are reachable under (link mode)
    #[serde(default)]
    pub public_base_url: Option<Url>,
}

/// Feed rendering variant; one per deployment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedMode {
    /// Fetch each object and return it as a base64 data URI
    #[default]
    Inline,
    /// Return `<public_base_url>/<key>` without reading object bodies
    Link,
}
