//! Health check endpoint
//!
//! Provides a simple health check for monitoring and load balancers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::handlers::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
    /// Whether Workers AI credentials are configured
    pub workers_ai_configured: bool,
    /// Whether an OpenRouter API key is configured
    pub openrouter_configured: bool,
}

/// Health check handler
///
/// Always 200 OK. Missing credentials do not make the service unhealthy (only
/// the routes that need them fail), but they are reported so a broken
/// deployment is easy to spot.
pub async fn handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let config = state.config();
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "OK",
            workers_ai_configured: config.cloudflare.credentials().is_ok(),
            openrouter_configured: config.openrouter.api_key().is_ok(),
        }),
    )
}
