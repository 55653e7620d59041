//! Text generation endpoints
//!
//! - `POST /cf-generate` runs a Workers AI model
//! - `POST /sonar-generate` runs an OpenRouter chat model, optionally with
//!   structured (JSON) output
//!
//! Both accept the same [`GenerationRequest`] body and share one dispatch path.

use crate::error::AppResult;
use crate::handlers::AppState;
use crate::handlers::extractor::ApiJson;
use crate::middleware::RequestId;
use crate::upstream::{Generated, GenerationRequest, Provider};
use axum::{Extension, extract::State};

/// POST /cf-generate handler
pub async fn cf_generate(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    ApiJson(request): ApiJson<GenerationRequest>,
) -> AppResult<Generated> {
    dispatch(&state, request_id, Provider::WorkersAi, &request).await
}

/// POST /sonar-generate handler
pub async fn sonar_generate(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    ApiJson(request): ApiJson<GenerationRequest>,
) -> AppResult<Generated> {
    dispatch(&state, request_id, Provider::OpenRouter, &request).await
}

async fn dispatch(
    state: &AppState,
    request_id: RequestId,
    provider: Provider,
    request: &GenerationRequest,
) -> AppResult<Generated> {
    tracing::debug!(
        request_id = %request_id,
        provider = provider.as_str(),
        prompt_length = request.prompt().len(),
        requested_model = ?request.model(),
        structured = request.wants_structured_output(),
        "Received generation request"
    );

    match state.dispatcher().generate(provider, request).await {
        Ok(generated) => {
            tracing::info!(
                request_id = %request_id,
                provider = provider.as_str(),
                structured = matches!(generated, Generated::Structured(_)),
                "Generation request completed"
            );
            Ok(generated)
        }
        Err(e) => {
            tracing::warn!(
                request_id = %request_id,
                provider = provider.as_str(),
                status = %e.status(),
                error = %e,
                "Generation request failed"
            );
            Err(e)
        }
    }
}
