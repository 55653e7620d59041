//! Sentiment classification endpoint
//!
//! `POST /sentiment` with `{text?}` relays the Workers AI classifier's answer.
//! The body is optional: an empty body classifies the default text.

use crate::error::{AppError, AppResult};
use crate::handlers::AppState;
use crate::middleware::RequestId;
use crate::upstream::UpstreamResult;
use axum::{Extension, body::Bytes, extract::State};
use serde::Deserialize;

/// Text classified when the request carries none
pub const DEFAULT_SENTIMENT_TEXT: &str = "I love this product";

/// Sentiment request from client
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SentimentRequest {
    #[serde(default)]
    text: Option<String>,
}

impl SentimentRequest {
    /// Parse a possibly empty request body
    pub fn from_body(body: &[u8]) -> AppResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| AppError::Validation(format!("invalid sentiment request body: {}", e)))
    }

    /// Text to classify, falling back to [`DEFAULT_SENTIMENT_TEXT`]
    pub fn text(&self) -> &str {
        self.text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .unwrap_or(DEFAULT_SENTIMENT_TEXT)
    }
}

/// POST /sentiment handler
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Bytes,
) -> AppResult<UpstreamResult> {
    let request = SentimentRequest::from_body(&body)?;
    tracing::debug!(
        request_id = %request_id,
        text_length = request.text().len(),
        "Received sentiment request"
    );

    let result = state.dispatcher().sentiment(request.text()).await;
    if let Err(e) = &result {
        tracing::warn!(
            request_id = %request_id,
            status = %e.status(),
            error = %e,
            "Sentiment request failed"
        );
    }
    result
}
