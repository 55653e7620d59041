//! Error types for flarerelay
//!
//! All errors implement `IntoResponse` for Axum handlers. Every error body is a
//! JSON object with an `error` field and, where one is available, a `detail`
//! string.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file {path}: {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration in {path}: {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    /// Missing or malformed client input. Raised before any network call.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Credentials for the selected provider are not configured.
    #[error("Misconfigured: {0}")]
    Misconfigured(String),

    /// Non-2xx answer from the provider. Status and body are relayed verbatim.
    #[error("Upstream returned {status}")]
    Upstream { status: StatusCode, body: Value },

    /// Model output could not be turned into the structured value the caller asked for.
    #[error("{message}: {detail}")]
    Parse {
        message: String,
        detail: String,
        raw: Value,
    },

    /// Transport-level failure while talking to the provider.
    #[error("Internal error: {detail}")]
    Internal { detail: String },
}

impl AppError {
    /// Shorthand for an [`AppError::Internal`] carrying `detail`
    pub fn internal(detail: impl ToString) -> Self {
        Self::Internal {
            detail: detail.to_string(),
        }
    }

    /// HTTP status this error is surfaced with
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Upstream { status, .. } => *status,
            Self::Parse { .. } => StatusCode::BAD_GATEWAY,
            Self::Config(_)
            | Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. }
            | Self::Misconfigured(_)
            | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::Validation(msg) | Self::Misconfigured(msg) | Self::Config(msg) => {
                json!({ "error": msg })
            }
            Self::Upstream { body, .. } => body,
            Self::Parse {
                message,
                detail,
                raw,
            } => json!({ "error": message, "detail": detail, "raw": raw }),
            Self::Internal { detail } => json!({ "error": "internal error", "detail": detail }),
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_validation_error_creates() {
        let err = AppError::Validation("invalid input".to_string());
        assert_eq!(err.to_string(), "Invalid request: invalid input");
    }

    #[test]
    fn test_internal_error_creates() {
        let err = AppError::internal("connection refused");
        assert_eq!(err.to_string(), "Internal error: connection refused");
    }

    #[tokio::test]
    async fn test_validation_error_response() {
        let response = AppError::Validation("missing prompt".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({ "error": "missing prompt" }));
    }

    #[tokio::test]
    async fn test_misconfigured_error_response() {
        let response = AppError::Misconfigured("no token".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "no token");
    }

    #[tokio::test]
    async fn test_upstream_error_relays_status_and_body() {
        let upstream = json!({ "errors": [{ "code": 7003, "message": "No route" }] });
        let response = AppError::Upstream {
            status: StatusCode::NOT_FOUND,
            body: upstream.clone(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, upstream);
    }

    #[tokio::test]
    async fn test_parse_error_keeps_raw_body() {
        let raw = json!({ "choices": [{ "message": { "content": "nope" } }] });
        let response = AppError::Parse {
            message: "failed to parse JSON from model output".to_string(),
            detail: "expected value at line 1 column 1".to_string(),
            raw: raw.clone(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert_eq!(body["error"], "failed to parse JSON from model output");
        assert_eq!(body["detail"], "expected value at line 1 column 1");
        assert_eq!(body["raw"], raw);
    }

    #[tokio::test]
    async fn test_internal_error_response_has_detail() {
        let response = AppError::internal("dns failure").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "internal error");
        assert_eq!(body["detail"], "dns failure");
    }

    #[test]
    fn test_config_validation_failed_status() {
        let err = AppError::ConfigValidationFailed {
            path: "flarerelay.toml".to_string(),
            reason: "bad port".to_string(),
        };
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("flarerelay.toml"));
    }
}
