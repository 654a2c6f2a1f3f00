//! Mock image generation backend for integration tests
//!
//! Serves both upstream APIs from one listener:
//! - `POST /v1/images/generations` (OpenAI-compatible)
//! - `POST /v1beta/models/{model}:generateImages` (Google)
//! - `GET /files/duck.png`, a downloadable image for URL responses

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::{Json, Router, routing};
use tokio_util::sync::CancellationToken;

/// Bytes served at `/files/duck.png`
pub const DUCK_PNG: &[u8] = b"\x89PNG\r\n\x1a\nduck";

/// Canned reply returned for every generation request
#[derive(Clone)]
pub struct MockResponse {
    status: StatusCode,
    body: serde_json::Value,
    delay: Option<Duration>,
}

impl MockResponse {
    /// 200 with the given body
    pub fn ok(body: serde_json::Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
            delay: None,
        }
    }

    /// Non-success status with the given body
    pub fn error(status: u16, body: serde_json::Value) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap(),
            body,
            delay: None,
        }
    }

    /// Answer only after `delay`
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Mock backend that records what the relay sent it
pub struct MockProvider {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    response: MockResponse,
    openai_count: AtomicU32,
    google_count: AtomicU32,
    last_body: Mutex<Option<serde_json::Value>>,
    last_authorization: Mutex<Option<String>>,
    last_google_key: Mutex<Option<String>>,
    last_google_model: Mutex<Option<String>>,
}

impl MockProvider {
    /// Start the mock server, returning immediately
    pub async fn start(response: MockResponse) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            response,
            openai_count: AtomicU32::new(0),
            google_count: AtomicU32::new(0),
            last_body: Mutex::new(None),
            last_authorization: Mutex::new(None),
            last_google_key: Mutex::new(None),
            last_google_model: Mutex::new(None),
        });

        let app = Router::new()
            .route("/v1/images/generations", routing::post(handle_openai))
            .route("/v1beta/models/{action}", routing::post(handle_google))
            .route("/files/duck.png", routing::get(handle_file))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL for the OpenAI-compatible provider
    pub fn openai_base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Base URL for the Google provider
    pub fn google_base_url(&self) -> String {
        format!("http://{}/v1beta", self.addr)
    }

    /// URL of a file path on the mock
    pub fn file_url(&self, name: &str) -> String {
        format!("http://{}/files/{name}", self.addr)
    }

    /// Number of OpenAI requests received
    pub fn openai_count(&self) -> u32 {
        self.state.openai_count.load(Ordering::Relaxed)
    }

    /// Number of Google requests received
    pub fn google_count(&self) -> u32 {
        self.state.google_count.load(Ordering::Relaxed)
    }

    /// Total generation requests received
    pub fn request_count(&self) -> u32 {
        self.openai_count() + self.google_count()
    }

    /// JSON body of the most recent generation request
    pub fn last_body(&self) -> Option<serde_json::Value> {
        self.state.last_body.lock().unwrap().clone()
    }

    /// `Authorization` header of the most recent OpenAI request
    pub fn last_authorization(&self) -> Option<String> {
        self.state.last_authorization.lock().unwrap().clone()
    }

    /// `key` query parameter of the most recent Google request
    pub fn last_google_key(&self) -> Option<String> {
        self.state.last_google_key.lock().unwrap().clone()
    }

    /// Model segment of the most recent Google request path
    pub fn last_google_model(&self) -> Option<String> {
        self.state.last_google_model.lock().unwrap().clone()
    }
}

impl Drop for MockProvider {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn reply(state: &MockState) -> (StatusCode, Json<serde_json::Value>) {
    if let Some(delay) = state.response.delay {
        tokio::time::sleep(delay).await;
    }
    (state.response.status, Json(state.response.body.clone()))
}

async fn handle_openai(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    state.openai_count.fetch_add(1, Ordering::Relaxed);
    *state.last_body.lock().unwrap() = Some(body);
    *state.last_authorization.lock().unwrap() = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    reply(&state).await
}

async fn handle_google(
    State(state): State<Arc<MockState>>,
    Path(action): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    state.google_count.fetch_add(1, Ordering::Relaxed);
    *state.last_body.lock().unwrap() = Some(body);
    *state.last_google_key.lock().unwrap() = query.get("key").cloned();
    *state.last_google_model.lock().unwrap() = action.strip_suffix(":generateImages").map(str::to_owned);

    reply(&state).await
}

async fn handle_file() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/png")], DUCK_PNG)
}
