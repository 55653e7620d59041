//! Request dispatch to upstream inference providers
//!
//! [`Dispatcher`] turns a validated client request into exactly one outbound
//! HTTP call and maps the provider's answer back:
//!
//! - credentials and default model come from [`Config`], resolved per provider;
//! - the endpoint and payload shape are chosen by [`target`];
//! - non-2xx answers are relayed as [`AppError::Upstream`];
//! - when the caller asks for structured output the generated text is decoded
//!   by [`extract::parse_structured`].
//!
//! There are no retries and no state carried between calls.

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::metrics::{Metrics, UpstreamOutcome};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub mod extract;
pub mod request;
pub mod schema;
pub mod target;

pub use extract::ParsedResult;
pub use request::GenerationRequest;
pub use schema::SchemaPreset;
pub use target::{PayloadShape, UpstreamTarget};

/// Upstream inference provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Cloudflare Workers AI
    WorkersAi,
    /// OpenRouter chat completions
    OpenRouter,
}

impl Provider {
    /// Label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::WorkersAi => "workers_ai",
            Provider::OpenRouter => "openrouter",
        }
    }

    fn vendor(&self) -> &'static str {
        match self {
            Provider::WorkersAi => "cloudflare",
            Provider::OpenRouter => "openrouter",
        }
    }
}

/// Successful provider answer: status plus raw JSON body
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResult {
    status: StatusCode,
    body: Value,
}

impl UpstreamResult {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn into_body(self) -> Value {
        self.body
    }
}

impl IntoResponse for UpstreamResult {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// What a generation call hands back to the client
#[derive(Debug, Clone, PartialEq)]
pub enum Generated {
    /// Upstream body passed through unchanged
    Raw(UpstreamResult),
    /// Upstream text decoded as JSON
    Structured(ParsedResult),
}

impl IntoResponse for Generated {
    fn into_response(self) -> Response {
        match self {
            Generated::Raw(result) => result.into_response(),
            Generated::Structured(parsed) => (StatusCode::OK, Json(parsed)).into_response(),
        }
    }
}

/// Single-shot dispatcher shared by all handlers
pub struct Dispatcher {
    client: reqwest::Client,
    config: Arc<Config>,
    metrics: Arc<Metrics>,
}

impl Dispatcher {
    /// Create a dispatcher with its own HTTP client
    ///
    /// The client timeout is only set when `server.request_timeout_seconds` is configured.
    pub fn new(config: Arc<Config>, metrics: Arc<Metrics>) -> AppResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(seconds) = config.server.request_timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        let client = builder
            .build()
            .map_err(|e| AppError::internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            metrics,
        })
    }

    /// Resolve the endpoint, payload and bearer token for `request`
    ///
    /// Fails with [`AppError::Misconfigured`] when the provider's credentials
    /// are not configured. Performs no I/O.
    pub fn resolve(
        &self,
        provider: Provider,
        request: &GenerationRequest,
    ) -> AppResult<(UpstreamTarget, &str)> {
        match provider {
            Provider::WorkersAi => {
                let cloudflare = &self.config.cloudflare;
                let credentials = cloudflare.credentials()?;
                let model = request.model().unwrap_or(cloudflare.model());
                let target = target::workers_ai(
                    cloudflare.base_url(),
                    credentials.account_id,
                    model,
                    request,
                )?;
                Ok((target, credentials.api_token))
            }
            Provider::OpenRouter => {
                let openrouter = &self.config.openrouter;
                let api_key = openrouter.api_key()?;
                let model = request.model().unwrap_or(openrouter.model());
                let target = target::openrouter(openrouter.base_url(), model, request)?;
                Ok((target, api_key))
            }
        }
    }

    /// Send `request` to `provider` and return the raw provider answer
    pub async fn complete(
        &self,
        provider: Provider,
        request: &GenerationRequest,
    ) -> AppResult<UpstreamResult> {
        let (target, token) = self.resolve(provider, request)?;
        self.send(provider, &target, token).await
    }

    /// Send `request` and, if asked for, decode the answer as structured output
    pub async fn generate(
        &self,
        provider: Provider,
        request: &GenerationRequest,
    ) -> AppResult<Generated> {
        let result = self.complete(provider, request).await?;
        if request.wants_structured_output() {
            extract::parse_structured(result.into_body()).map(Generated::Structured)
        } else {
            Ok(Generated::Raw(result))
        }
    }

    /// Classify `text` with the configured Workers AI sentiment model
    pub async fn sentiment(&self, text: &str) -> AppResult<UpstreamResult> {
        let cloudflare = &self.config.cloudflare;
        let credentials = cloudflare.credentials()?;
        let target = target::sentiment(
            cloudflare.base_url(),
            credentials.account_id,
            cloudflare.sentiment_model(),
            text,
        )?;
        self.send(Provider::WorkersAi, &target, credentials.api_token)
            .await
    }

    /// Generate text with Workers AI and return it with code fences removed
    ///
    /// Fails with [`AppError::Parse`] when the answer carries no text.
    pub async fn generate_text(&self, request: &GenerationRequest) -> AppResult<String> {
        let result = self.complete(Provider::WorkersAi, request).await?;
        let text = extract::extract_text(result.body())
            .map(|(_, text)| extract::strip_code_fences(text))
            .filter(|text| !text.is_empty())
            .map(str::to_string);

        text.ok_or_else(|| AppError::Parse {
            message: "no textual content found in model output".to_string(),
            detail: "none of the known response fields held text".to_string(),
            raw: result.into_body(),
        })
    }

    async fn send(
        &self,
        provider: Provider,
        target: &UpstreamTarget,
        token: &str,
    ) -> AppResult<UpstreamResult> {
        let started = Instant::now();
        tracing::debug!(
            provider = provider.as_str(),
            url = %target.url(),
            shape = ?target.shape(),
            "Sending upstream request"
        );

        let result = self.exchange(provider, target, token).await;
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

        let outcome = match &result {
            Ok(_) => UpstreamOutcome::Success,
            Err(AppError::Upstream { .. }) => UpstreamOutcome::UpstreamError,
            Err(_) => UpstreamOutcome::TransportError,
        };
        tracing::debug!(
            provider = provider.as_str(),
            outcome = outcome.as_str(),
            duration_ms,
            "Upstream request finished"
        );
        if let Err(e) = self.metrics.record_upstream(provider, outcome, duration_ms) {
            // Metrics are non-critical; the request continues
            tracing::error!(
                error = %e,
                provider = provider.as_str(),
                outcome = outcome.as_str(),
                "Metrics recording failed (non-fatal)"
            );
        }

        result
    }

    async fn exchange(
        &self,
        provider: Provider,
        target: &UpstreamTarget,
        token: &str,
    ) -> AppResult<UpstreamResult> {
        let response = self
            .client
            .post(target.url())
            .bearer_auth(token)
            .json(target.payload())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    provider = provider.as_str(),
                    error = %e,
                    "Upstream request failed"
                );
                AppError::internal(e)
            })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| {
            tracing::error!(
                provider = provider.as_str(),
                status = %status,
                error = %e,
                "Failed to read upstream response body"
            );
            AppError::internal(e)
        })?;
        // Best effort: a non-JSON body is replaced below, never an error on its own
        let body = serde_json::from_slice::<Value>(&bytes).ok();

        if !status.is_success() {
            tracing::warn!(
                provider = provider.as_str(),
                status = %status,
                json_body = body.is_some(),
                "Upstream returned an error status"
            );
            let body = body.unwrap_or_else(|| {
                json!({ "error": format!("{} returned non-JSON response", provider.vendor()) })
            });
            return Err(AppError::Upstream { status, body });
        }

        tracing::debug!(
            provider = provider.as_str(),
            status = %status,
            "Upstream request succeeded"
        );
        Ok(UpstreamResult::new(status, body.unwrap_or(Value::Null)))
    }
}
