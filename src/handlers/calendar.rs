//! Calendar (.ics) generation endpoint
//!
//! `POST /api/process-with-ai` takes either a ready prompt or a page's HTML,
//! asks Workers AI for an iCalendar document and returns it base64-encoded.

use crate::error::{AppError, AppResult};
use crate::handlers::AppState;
use crate::handlers::extractor::ApiJson;
use crate::middleware::RequestId;
use crate::upstream::GenerationRequest;
use axum::{Extension, Json, extract::State};
use base64::Engine;
use serde::{Deserialize, Serialize};

const CALENDAR_SYSTEM_PROMPT: &str = "You convert schedules into iCalendar (.ics) files. \
    Reply with the .ics document only, starting with BEGIN:VCALENDAR and ending with END:VCALENDAR.";

const HTML_PROMPT_PREFIX: &str = "Extract every dated event (classes, exams, deadlines, \
    meetings) from the following HTML and return them as a single valid iCalendar (.ics) \
    document. Do not include any explanation.\n\nHTML:\n";

/// Calendar request from client: `prompt` or `html`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalendarRequest {
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    html: Option<String>,
}

impl CalendarRequest {
    /// Prompt to send upstream
    ///
    /// An explicit `prompt` wins; otherwise one is built around `html`.
    pub fn to_prompt(&self) -> AppResult<String> {
        let non_blank = |value: &Option<String>| {
            value
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .map(str::to_string)
        };

        if let Some(prompt) = non_blank(&self.prompt) {
            return Ok(prompt);
        }
        if let Some(html) = non_blank(&self.html) {
            return Ok(format!("{}{}", HTML_PROMPT_PREFIX, html));
        }
        Err(AppError::Validation(
            "request body must include string \"prompt\" or \"html\"".to_string(),
        ))
    }
}

/// Calendar response: the .ics document, base64-encoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarResponse {
    pub base64: String,
}

impl CalendarResponse {
    pub fn from_ics(ics: &str) -> Self {
        Self {
            base64: base64::engine::general_purpose::STANDARD.encode(ics.as_bytes()),
        }
    }
}

/// POST /api/process-with-ai handler
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    ApiJson(request): ApiJson<CalendarRequest>,
) -> AppResult<Json<CalendarResponse>> {
    let prompt = request.to_prompt()?;
    tracing::debug!(
        request_id = %request_id,
        prompt_length = prompt.len(),
        from_html = request.prompt.is_none(),
        "Received calendar request"
    );

    let generation = GenerationRequest::new(prompt)?.with_system(CALENDAR_SYSTEM_PROMPT);
    let ics = state
        .dispatcher()
        .generate_text(&generation)
        .await
        .inspect_err(|e| {
            tracing::warn!(
                request_id = %request_id,
                status = %e.status(),
                error = %e,
                "Calendar generation failed"
            );
        })?;

    tracing::info!(
        request_id = %request_id,
        ics_length = ics.len(),
        "Calendar generated"
    );
    Ok(Json(CalendarResponse::from_ics(&ics)))
}
