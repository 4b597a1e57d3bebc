//! Request parsing helpers shared by the HTTP handlers.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use bookstore_http::error::AppError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Parse a path segment as a 64-bit record identifier.
pub fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>().map_err(|err| {
        tracing::debug!(raw, error = %err, "rejecting non-numeric identifier");
        AppError::bad_request(format!("invalid identifier '{}': {}", raw, err))
    })
}

/// Decode a JSON object request body into `T`.
///
/// An empty body is rejected rather than treated as an empty object. Arrays
/// and scalars are rejected too, so fields are never bound by position.
pub fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::bad_request("request body is empty"));
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|err| AppError::bad_request(format!("malformed JSON body: {}", err)))?;
    if !value.is_object() {
        return Err(AppError::bad_request("request body must be a JSON object"));
    }

    serde_json::from_value(value)
        .map_err(|err| AppError::bad_request(format!("malformed JSON body: {}", err)))
}

/// JSON body extractor that ignores the `Content-Type` header and reports
/// decode failures as [`AppError::BadRequest`].
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

        parse_body(&bytes).map(JsonBody)
    }
}
