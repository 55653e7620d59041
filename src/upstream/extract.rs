//! Text extraction and structured-output parsing
//!
//! Providers put the generated text in different places. [`EXTRACTION_STRATEGIES`]
//! lists the known locations in the order they are tried; the first one that
//! holds a non-empty string wins.

use crate::error::{AppError, AppResult};
use serde::Serialize;
use serde_json::Value;

/// One known location of generated text inside a provider response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionStrategy {
    pub name: &'static str,
    /// JSON pointer (RFC 6901) into the response body
    pub pointer: &'static str,
}

/// Known text locations, tried in order
pub const EXTRACTION_STRATEGIES: &[ExtractionStrategy] = &[
    // OpenAI-style chat completions (OpenRouter)
    ExtractionStrategy {
        name: "chat_message",
        pointer: "/choices/0/message/content",
    },
    // Legacy completions
    ExtractionStrategy {
        name: "completion_text",
        pointer: "/choices/0/text",
    },
    // Responses API (Workers AI ai/v1/responses)
    ExtractionStrategy {
        name: "responses_output",
        pointer: "/output/0/content/0/text",
    },
    // Workers AI ai/run envelope
    ExtractionStrategy {
        name: "workers_ai_result",
        pointer: "/result/response",
    },
];

/// Generated text from a provider response, with the strategy that found it
pub fn extract_text(body: &Value) -> Option<(&'static ExtractionStrategy, &str)> {
    EXTRACTION_STRATEGIES.iter().find_map(|strategy| {
        body.pointer(strategy.pointer)
            .and_then(Value::as_str)
            .filter(|text| !text.trim().is_empty())
            .map(|text| (strategy, text))
    })
}

/// Remove a wrapping Markdown code fence
///
/// Handles an opening fence with or without a language tag (```` ```json ````,
/// ```` ```ics ````) and a closing fence. Text without a leading fence is only trimmed.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let (opening, after) = rest.split_once('\n').unwrap_or((rest, ""));
    let body = if is_info_string(opening.trim()) {
        after
    } else {
        // Content on the fence line itself, possibly behind a language tag
        match opening.trim_start().split_once(char::is_whitespace) {
            Some((tag, _)) if is_info_string(tag) => rest.trim_start()[tag.len()..].trim_start(),
            _ => rest,
        }
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// A fence language tag such as `json`, `ics` or `c++`; empty is allowed
fn is_info_string(line: &str) -> bool {
    line.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.'))
}

/// Result of decoding a model's answer as JSON
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedResult {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    parsed: Option<Value>,
    raw: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ParsedResult {
    pub fn success(&self) -> bool {
        self.success
    }

    pub fn parsed(&self) -> Option<&Value> {
        self.parsed.as_ref()
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Decode the generated text of `raw` as JSON
///
/// A response with no text at all yields `success: false` rather than an
/// error; text that is present but not JSON is an [`AppError::Parse`].
pub fn parse_structured(raw: Value) -> AppResult<ParsedResult> {
    let parsed = match extract_text(&raw) {
        None => {
            return Ok(ParsedResult {
                success: false,
                parsed: None,
                raw,
                error: Some("no textual content found to parse".to_string()),
            });
        }
        Some((strategy, text)) => {
            tracing::debug!(strategy = strategy.name, "Extracted model text for parsing");
            serde_json::from_str::<Value>(strip_code_fences(text))
        }
    };

    match parsed {
        Ok(parsed) => Ok(ParsedResult {
            success: true,
            parsed: Some(parsed),
            raw,
            error: None,
        }),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to parse JSON from model output");
            Err(AppError::Parse {
                message: "failed to parse JSON from model output".to_string(),
                detail: e.to_string(),
                raw,
            })
        }
    }
}
