use axum::{Json, response::IntoResponse};
use http::StatusCode;

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Smoke-test endpoint used by the web client
pub async fn test_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "Test endpoint working!" }))
}
