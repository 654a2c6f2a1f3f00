mod cors;
mod health;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, routing::get};
use duckgen_config::Config;
use duckgen_storage::BlobStore;
use http::Method;
use tower_http::trace::TraceLayer;

/// Port the relay listens on when no address is configured
pub const DEFAULT_PORT: u16 = 8788;

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration, opening the configured store
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened or a subsystem fails
    /// to initialize
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = duckgen_storage::build_store(config.storage.as_ref())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to open image store: {e}"))?;

        Self::with_store(config, store)
    }

    /// Build the server around an existing store
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or a subsystem fails
    /// to initialize
    pub fn with_store(config: Config, store: Option<Arc<dyn BlobStore>>) -> anyhow::Result<Self> {
        config.validate()?;

        let listen_address = config
            .server
            .listen_address
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)));

        let imagegen_state = duckgen_imagegen::build_server(&config, store.clone())?;
        let feed_state = duckgen_feed::build_feed(&config, store)?;
        let cors_config = &config.server.cors;

        let mut app = Router::new();

        // Health check
        if config.server.health.enabled {
            app = app.route(&config.server.health.path, get(health::health_handler));
        }

        app = app.route("/api/test", get(health::test_handler));

        // Image generation
        app = app.merge(
            duckgen_imagegen::endpoint_router()
                .with_state(imagegen_state)
                .layer(cors::cors_layer(cors_config, &[Method::POST, Method::OPTIONS])),
        );

        // Feed
        app = app.merge(
            duckgen_feed::feed_router()
                .with_state(feed_state.clone())
                .layer(cors::cors_layer(cors_config, &[Method::GET, Method::OPTIONS])),
        );

        // Stored images
        app = app.merge(duckgen_feed::images_router().with_state(feed_state));

        app = app.layer(TraceLayer::new_for_http());

        Ok(Self {
            router: app,
            listen_address,
        })
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}
