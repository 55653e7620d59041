//! JSON extractor with the API's own error envelope
//!
//! Wraps Axum's `Json` extractor so that every body problem (bad syntax,
//! missing or invalid fields, wrong content type) becomes a 400 with an
//! `{"error": ...}` body, the same shape as every other error.

use crate::error::AppError;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;

/// Map an Axum JSON rejection to [`AppError::Validation`]
pub fn rejection_to_error(rejection: JsonRejection) -> AppError {
    let message = match &rejection {
        JsonRejection::MissingJsonContentType(_) => {
            "Content-Type must be application/json".to_string()
        }
        _ => rejection.body_text(),
    };
    AppError::Validation(message)
}

/// Custom JSON extractor producing [`AppError`] rejections
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "Rejected request body");
                Err(rejection_to_error(rejection))
            }
        }
    }
}
