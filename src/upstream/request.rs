//! Client-facing generation request
//!
//! Validation is enforced during deserialization - a `GenerationRequest`
//! without a usable prompt cannot exist, so it is rejected before any
//! upstream call is attempted.

use crate::error::{AppError, AppResult};
use crate::upstream::schema::SchemaPreset;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

const MISSING_PROMPT: &str = "request body must include string \"prompt\"";

/// Prompt plus optional generation overrides
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    prompt: String,
    model: Option<String>,
    system: Option<String>,
    temperature: Option<f64>,
    max_output_tokens: Option<u32>,
    parse_json: bool,
    response_format: Option<Value>,
    schema: Option<SchemaPreset>,
}

impl GenerationRequest {
    /// Build a request from a prompt, rejecting empty or whitespace-only text
    pub fn new(prompt: impl Into<String>) -> AppResult<Self> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(AppError::Validation(MISSING_PROMPT.to_string()));
        }
        Ok(Self {
            prompt,
            model: None,
            system: None,
            temperature: None,
            max_output_tokens: None,
            parse_json: false,
            response_format: None,
            schema: None,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_parse_json(mut self, parse_json: bool) -> Self {
        self.parse_json = parse_json;
        self
    }

    pub fn with_response_format(mut self, response_format: Value) -> Self {
        self.response_format = Some(response_format);
        self
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Model requested by the caller, if any
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn system(&self) -> Option<&str> {
        self.system.as_deref()
    }

    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    pub fn max_output_tokens(&self) -> Option<u32> {
        self.max_output_tokens
    }

    /// `response_format` to forward upstream
    ///
    /// An explicit `response_format` from the caller takes precedence over a
    /// named schema preset.
    pub fn response_format(&self) -> Option<Value> {
        self.response_format
            .clone()
            .or_else(|| self.schema.map(SchemaPreset::response_format))
    }

    /// Whether the model's text answer should be decoded as JSON
    pub fn wants_structured_output(&self) -> bool {
        self.parse_json
            || self.schema.is_some()
            || self
                .response_format
                .as_ref()
                .and_then(|format| format.get("type"))
                .and_then(Value::as_str)
                == Some("json_schema")
    }
}

/// Token limit given as any JSON number with an integral, non-negative value
fn token_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<f64>::deserialize(deserializer)? {
        None => Ok(None),
        Some(n) if n.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&n) => {
            Ok(Some(n as u32))
        }
        Some(n) => Err(serde::de::Error::custom(format!(
            "max_output_tokens must be a non-negative integer, got {}",
            n
        ))),
    }
}

impl<'de> Deserialize<'de> for GenerationRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawGenerationRequest {
            #[serde(default)]
            prompt: Option<Value>,
            #[serde(default)]
            model: Option<String>,
            #[serde(default)]
            system: Option<String>,
            #[serde(default)]
            temperature: Option<f64>,
            #[serde(default, deserialize_with = "token_count")]
            max_output_tokens: Option<u32>,
            #[serde(default)]
            parse_json: Option<bool>,
            #[serde(default)]
            response_format: Option<Value>,
            #[serde(default)]
            schema: Option<SchemaPreset>,
        }

        let raw = RawGenerationRequest::deserialize(deserializer)?;

        let prompt = match raw.prompt {
            Some(Value::String(prompt)) if !prompt.trim().is_empty() => prompt,
            _ => return Err(serde::de::Error::custom(MISSING_PROMPT)),
        };

        // Empty strings mean "not provided", same as an absent field
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        Ok(GenerationRequest {
            prompt,
            model: non_empty(raw.model),
            system: non_empty(raw.system),
            temperature: raw.temperature,
            max_output_tokens: raw.max_output_tokens,
            parse_json: raw.parse_json.unwrap_or(false),
            response_format: raw.response_format.filter(|v| !v.is_null()),
            schema: raw.schema,
        })
    }
}
