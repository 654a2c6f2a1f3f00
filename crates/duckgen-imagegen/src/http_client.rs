use std::time::Duration;

use reqwest::Client;

/// HTTP client shared by both providers and the image download path
///
/// No overall request timeout is set here: each upstream call is bounded by
/// its provider's configured timeout instead.
pub fn build_http_client() -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(concat!("duckgen/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(10))
        .pool_idle_timeout(Some(Duration::from_secs(30)))
        .tcp_nodelay(true)
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .build()
}
