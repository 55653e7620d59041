//! Upstream endpoint selection and payload construction
//!
//! Workers AI exposes two ways to run a model. Model identifiers that start
//! with the provider namespace marker (`@cf/...`, `@hf/...`) name a model
//! directly and go to `ai/run/{model}` with a chat payload. Everything else
//! goes to the generic `ai/v1/responses` endpoint with the model as a field.

use crate::error::{AppError, AppResult};
use crate::upstream::GenerationRequest;
use serde::Serialize;
use serde_json::Value;

/// Prefix that marks a provider-namespaced (directly invocable) model
pub const NAMESPACE_MARKER: char = '@';

pub const DEFAULT_TEMPERATURE: f64 = 0.2;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 512;
pub const WORKERS_AI_SYSTEM_PROMPT: &str = "You are a friendly assistant";
pub const OPENROUTER_SYSTEM_PROMPT: &str = "You are a helpful assistant";

/// Body layout expected by the selected endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// `{messages: [system, user]}`
    Chat,
    /// `{input, model, temperature, max_output_tokens}`
    Flat,
    /// `{model, messages, temperature, max_tokens, response_format?}`
    ChatCompletion,
    /// `{text}`
    Text,
}

/// Where to send a request and what to send
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamTarget {
    url: String,
    shape: PayloadShape,
    payload: Value,
}

impl UpstreamTarget {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn shape(&self) -> PayloadShape {
        self.shape
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> Message<'a> {
    fn pair(system: &'a str, prompt: &'a str) -> [Message<'a>; 2] {
        [
            Message {
                role: "system",
                content: system,
            },
            Message {
                role: "user",
                content: prompt,
            },
        ]
    }
}

#[derive(Serialize)]
struct ChatPayload<'a> {
    messages: [Message<'a>; 2],
}

#[derive(Serialize)]
struct FlatPayload<'a> {
    input: &'a str,
    model: &'a str,
    temperature: f64,
    max_output_tokens: u32,
}

#[derive(Serialize)]
struct ChatCompletionPayload<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f64,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[derive(Serialize)]
struct TextPayload<'a> {
    text: &'a str,
}

fn build<T: Serialize>(url: String, shape: PayloadShape, payload: T) -> AppResult<UpstreamTarget> {
    let payload = serde_json::to_value(payload)
        .map_err(|e| AppError::internal(format!("failed to encode upstream payload: {}", e)))?;
    Ok(UpstreamTarget {
        url,
        shape,
        payload,
    })
}

/// Whether `model` names a directly invocable model
pub fn is_direct_model(model: &str) -> bool {
    model.starts_with(NAMESPACE_MARKER)
}

/// Workers AI target for a generation request
pub fn workers_ai(
    base_url: &str,
    account_id: &str,
    model: &str,
    request: &GenerationRequest,
) -> AppResult<UpstreamTarget> {
    if is_direct_model(model) {
        let system = request.system().unwrap_or(WORKERS_AI_SYSTEM_PROMPT);
        build(
            format!("{}/accounts/{}/ai/run/{}", base_url, account_id, model),
            PayloadShape::Chat,
            ChatPayload {
                messages: Message::pair(system, request.prompt()),
            },
        )
    } else {
        build(
            format!("{}/accounts/{}/ai/v1/responses", base_url, account_id),
            PayloadShape::Flat,
            FlatPayload {
                input: request.prompt(),
                model,
                temperature: request.temperature().unwrap_or(DEFAULT_TEMPERATURE),
                max_output_tokens: request
                    .max_output_tokens()
                    .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
            },
        )
    }
}

/// OpenRouter chat-completions target
pub fn openrouter(
    base_url: &str,
    model: &str,
    request: &GenerationRequest,
) -> AppResult<UpstreamTarget> {
    let system = request.system().unwrap_or(OPENROUTER_SYSTEM_PROMPT);
    build(
        format!("{}/chat/completions", base_url),
        PayloadShape::ChatCompletion,
        ChatCompletionPayload {
            model,
            messages: Message::pair(system, request.prompt()),
            temperature: request.temperature().unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: request
                .max_output_tokens()
                .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
            response_format: request.response_format(),
        },
    )
}

/// Workers AI text-classification target
pub fn sentiment(
    base_url: &str,
    account_id: &str,
    model: &str,
    text: &str,
) -> AppResult<UpstreamTarget> {
    build(
        format!("{}/accounts/{}/ai/run/{}", base_url, account_id, model),
        PayloadShape::Text,
        TextPayload { text },
    )
}
