//! Configuration management for flarerelay
//!
//! Settings come from an optional TOML file and are then overlaid by
//! environment variables, so a bare deployment can run on environment alone.
//! Provider credentials are optional at load time; a request that needs a
//! missing credential fails with [`AppError::Misconfigured`].

use crate::error::{AppError, AppResult};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 8787;
pub const DEFAULT_WORKERS_AI_BASE_URL: &str = "https://api.cloudflare.com/client/v4";
pub const DEFAULT_WORKERS_AI_MODEL: &str = "@cf/meta/llama-3.1-8b-instruct-fast";
pub const DEFAULT_SENTIMENT_MODEL: &str = "@cf/huggingface/distilbert-sst-2-int8";
pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_OPENROUTER_MODEL: &str = "perplexity/sonar";

const ACCOUNT_ID_VARS: &[&str] = &["CLOUDFLARE_ACCOUNT_ID", "CF_ACCOUNT_ID"];
const API_TOKEN_VARS: &[&str] = &["CLOUDFLARE_API_TOKEN", "CF_TOKEN", "CLOUDFLARE_AUTH_TOKEN"];
const WORKERS_AI_MODEL_VARS: &[&str] = &["CLOUDFLARE_MODEL"];
const OPENROUTER_KEY_VARS: &[&str] = &["OPENROUTER_API_KEY", "OR_API_KEY"];
const OPENROUTER_MODEL_VARS: &[&str] = &["OPENROUTER_PERPLEXITY_MODEL"];
const PORT_VARS: &[&str] = &["PORT"];

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cloudflare: CloudflareConfig,
    #[serde(default)]
    pub openrouter: OpenRouterConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upstream request timeout. Unset means the HTTP client default (no timeout).
    #[serde(default)]
    pub request_timeout_seconds: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Cloudflare Workers AI settings
///
/// Credential fields are private; use [`CloudflareConfig::credentials`], which
/// fails with a request-level error when either half is missing.
#[derive(Clone, Deserialize)]
pub struct CloudflareConfig {
    #[serde(default)]
    account_id: Option<String>,
    #[serde(default)]
    api_token: Option<String>,
    /// Model used when the request names none
    #[serde(default = "default_workers_ai_model")]
    model: String,
    #[serde(default = "default_sentiment_model")]
    sentiment_model: String,
    #[serde(default = "default_workers_ai_base_url")]
    base_url: String,
}

/// A credential set to an empty string counts as absent
fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Account id and bearer token for Workers AI
#[derive(Debug, Clone, Copy)]
pub struct WorkersAiCredentials<'a> {
    pub account_id: &'a str,
    pub api_token: &'a str,
}

impl CloudflareConfig {
    /// Resolve account id and token, or fail with [`AppError::Misconfigured`]
    pub fn credentials(&self) -> AppResult<WorkersAiCredentials<'_>> {
        match (non_blank(&self.account_id), non_blank(&self.api_token)) {
            (Some(account_id), Some(api_token)) => Ok(WorkersAiCredentials {
                account_id,
                api_token,
            }),
            _ => Err(AppError::Misconfigured(
                "cloudflare account id and token must be set in env \
                (CLOUDFLARE_ACCOUNT_ID / CLOUDFLARE_API_TOKEN or CF_ACCOUNT_ID / CF_TOKEN)"
                    .to_string(),
            )),
        }
    }

    /// Get the default generation model
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get the sentiment classification model
    pub fn sentiment_model(&self) -> &str {
        &self.sentiment_model
    }

    /// Get the API base URL (without trailing slash)
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

impl Default for CloudflareConfig {
    fn default() -> Self {
        Self {
            account_id: None,
            api_token: None,
            model: default_workers_ai_model(),
            sentiment_model: default_sentiment_model(),
            base_url: default_workers_ai_base_url(),
        }
    }
}

impl std::fmt::Debug for CloudflareConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareConfig")
            .field("account_id", &self.account_id)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("sentiment_model", &self.sentiment_model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn default_workers_ai_model() -> String {
    DEFAULT_WORKERS_AI_MODEL.to_string()
}

fn default_sentiment_model() -> String {
    DEFAULT_SENTIMENT_MODEL.to_string()
}

fn default_workers_ai_base_url() -> String {
    DEFAULT_WORKERS_AI_BASE_URL.to_string()
}

/// OpenRouter settings
#[derive(Clone, Deserialize)]
pub struct OpenRouterConfig {
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default = "default_openrouter_model")]
    model: String,
    #[serde(default = "default_openrouter_base_url")]
    base_url: String,
}

impl OpenRouterConfig {
    /// Resolve the API key, or fail with [`AppError::Misconfigured`]
    pub fn api_key(&self) -> AppResult<&str> {
        non_blank(&self.api_key).ok_or_else(|| {
            AppError::Misconfigured(
                "openrouter api key must be set in env (OPENROUTER_API_KEY or OR_API_KEY)"
                    .to_string(),
            )
        })
    }

    /// Get the default chat model
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get the API base URL (without trailing slash)
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_openrouter_model(),
            base_url: default_openrouter_base_url(),
        }
    }
}

impl std::fmt::Debug for OpenRouterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn default_openrouter_model() -> String {
    DEFAULT_OPENROUTER_MODEL.to_string()
}

fn default_openrouter_base_url() -> String {
    DEFAULT_OPENROUTER_BASE_URL.to_string()
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// First non-empty value among `names`, in order
fn first_set<F>(lookup: &F, names: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    names
        .iter()
        .copied()
        .filter_map(|name| lookup(name))
        .find(|value| !value.trim().is_empty())
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| {
            AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            }
        })?;

        let config: Self =
            toml::from_str(&content).map_err(|source| AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            })?;

        config
            .validate()
            .map_err(|e| AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Build the runtime configuration: optional file, then process environment
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay values from an environment lookup
    ///
    /// Each setting accepts several variable names; the first non-empty one wins
    /// and replaces whatever the file provided.
    pub fn apply_env<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(account_id) = first_set(&lookup, ACCOUNT_ID_VARS) {
            self.cloudflare.account_id = Some(account_id);
        }
        if let Some(token) = first_set(&lookup, API_TOKEN_VARS) {
            self.cloudflare.api_token = Some(token);
        }
        if let Some(model) = first_set(&lookup, WORKERS_AI_MODEL_VARS) {
            self.cloudflare.model = model;
        }
        if let Some(key) = first_set(&lookup, OPENROUTER_KEY_VARS) {
            self.openrouter.api_key = Some(key);
        }
        if let Some(model) = first_set(&lookup, OPENROUTER_MODEL_VARS) {
            self.openrouter.model = model;
        }
        if let Some(port) = first_set(&lookup, PORT_VARS) {
            self.server.port = port.trim().parse().map_err(|_| {
                AppError::Config(format!("PORT must be a valid port number, got '{}'", port))
            })?;
        }
        Ok(())
    }

    /// Validate configuration after parsing
    pub fn validate(&self) -> AppResult<()> {
        for (name, url) in [
            ("cloudflare.base_url", &self.cloudflare.base_url),
            ("openrouter.base_url", &self.openrouter.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(AppError::Config(format!(
                    "{} must start with 'http://' or 'https://', got '{}'",
                    name, url
                )));
            }
        }

        for (name, model) in [
            ("cloudflare.model", &self.cloudflare.model),
            ("cloudflare.sentiment_model", &self.cloudflare.sentiment_model),
            ("openrouter.model", &self.openrouter.model),
        ] {
            if model.trim().is_empty() {
                return Err(AppError::Config(format!("{} cannot be empty", name)));
            }
        }

        if self.server.port == 0 {
            return Err(AppError::Config(
                "server.port must be greater than 0".to_string(),
            ));
        }

        if let Some(timeout) = self.server.request_timeout_seconds {
            if timeout == 0 || timeout > 300 {
                return Err(AppError::Config(format!(
                    "server.request_timeout_seconds must be in 1..=300, got {}",
                    timeout
                )));
            }
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = AppError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config =
            toml::from_str(toml_str).map_err(|source| AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }
}
