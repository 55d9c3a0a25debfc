//! Extract a non-empty JSON object body, regardless of the Content-Type header.

use crate::error::AppError;
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde_json::Value;
use std::collections::HashMap;

pub const INVALID_BODY: &str = "Invalid body!";
pub const INVALID_JSON_BODY: &str = "Invalid json body!";

/// Body as a map of top-level fields. Rejects malformed JSON, lists, scalars, null and `{}`.
#[derive(Clone, Debug)]
pub struct JsonObject(pub HashMap<String, Value>);

/// Shared by the extractor and the body-checking middleware.
pub fn parse_object(bytes: &[u8]) -> Result<HashMap<String, Value>, AppError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::Validation(INVALID_BODY.into()));
    }
    let value: Value =
        serde_json::from_slice(bytes).map_err(|_| AppError::Validation(INVALID_JSON_BODY.into()))?;
    match value {
        Value::Object(m) if !m.is_empty() => Ok(m.into_iter().collect()),
        _ => Err(AppError::Validation(INVALID_BODY.into())),
    }
}

#[async_trait]
impl<S> FromRequest<S> for JsonObject
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|_| AppError::Validation(INVALID_BODY.into()))?;
        parse_object(&bytes).map(JsonObject)
    }
}
