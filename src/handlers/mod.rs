//! HTTP request handlers for the flarerelay API

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::metrics::Metrics;
use crate::middleware::request_id_middleware;
use crate::upstream::Dispatcher;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod calendar;
pub mod extractor;
pub mod generate;
pub mod health;
pub mod metrics;
pub mod sentiment;

/// Application state shared across all handlers
///
/// All fields are Arc'd for cheap cloning across Axum handlers. Nothing in
/// here is mutated per request.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    dispatcher: Arc<Dispatcher>,
    metrics: Arc<Metrics>,
}

impl AppState {
    /// Create a new AppState from configuration
    pub fn new(config: Arc<Config>) -> AppResult<Self> {
        let metrics = Arc::new(Metrics::new().map_err(|e| {
            AppError::internal(format!("failed to register metrics: {}", e))
        })?);
        let dispatcher = Arc::new(Dispatcher::new(config.clone(), metrics.clone())?);

        Ok(Self {
            config,
            dispatcher,
            metrics,
        })
    }

    /// Get reference to the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get reference to the upstream dispatcher
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Get reference to the metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

/// Build the full API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/cf-generate", post(generate::cf_generate))
        .route("/sonar-generate", post(generate::sonar_generate))
        .route("/sentiment", post(sentiment::handler))
        .route("/api/process-with-ai", post(calendar::handler))
        .route("/health", get(health::handler))
        .route("/metrics", get(metrics::handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
}
