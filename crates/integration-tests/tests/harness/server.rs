//! Test server wrapper that starts duckgen on a random port

use std::net::SocketAddr;
use std::sync::Arc;

use duckgen_config::Config;
use duckgen_server::Server;
use duckgen_storage::BlobStore;
use tokio_util::sync::CancellationToken;

/// A running test server instance
pub struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    client: reqwest::Client,
}

impl TestServer {
    /// Start a test server, opening whatever store the configuration names
    pub async fn start(config: Config) -> anyhow::Result<Self> {
        Self::serve(Server::new(config).await?).await
    }

    /// Start a test server around a store the test keeps a handle to
    pub async fn start_with_store(config: Config, store: Arc<dyn BlobStore>) -> anyhow::Result<Self> {
        Self::serve(Server::with_store(config, Some(store))?).await
    }

    async fn serve(server: Server) -> anyhow::Result<Self> {
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        // Bind the listener here so we know the actual port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        tokio::spawn(async move {
            axum::serve(listener, server.into_router())
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self {
            addr,
            shutdown,
            client: reqwest::Client::new(),
        })
    }

    /// URL of a path on the running test server
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Get a reference to the HTTP client
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// `POST /api/generate` with a JSON body
    pub async fn generate(&self, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(self.url("/api/generate"))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    /// `GET /api/feed`, returning the `images` array
    pub async fn feed(&self) -> Vec<String> {
        let response = self.client.get(self.url("/api/feed")).send().await.unwrap();
        assert_eq!(response.status(), 200);

        let body: serde_json::Value = response.json().await.unwrap();
        serde_json::from_value(body["images"].clone()).unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
