//! Pre-handler checks (numeric path ids, JSON object bodies) and request-id tracing.

use crate::error::AppError;
use crate::extractors::json_object::{parse_object, INVALID_BODY};
use crate::response::error_body;
use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, RawPathParams, Request},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::Instrument;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Path parameters that carry entity ids, with the label used in the rejection reason.
const ID_PARAMS: &[(&str, &str)] = &[
    ("template_id", "Template"),
    ("workspace_id", "Workspace"),
    ("user_id", "User"),
];

fn is_valid_id(raw: &str) -> bool {
    !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) && raw.parse::<i64>().is_ok()
}

/// Rejects `/template/abc` and friends with 400 before the Path extractor runs.
/// Must be installed with `route_layer` so the matched path params are available.
pub async fn validate_path_ids(params: Option<RawPathParams>, req: Request, next: Next) -> Response {
    if let Some(params) = params {
        for (key, value) in &params {
            let Some((_, label)) = ID_PARAMS.iter().find(|(name, _)| *name == key) else {
                continue;
            };
            if !is_valid_id(value) {
                tracing::warn!(param = key, value, "rejected non-numeric id");
                return AppError::Validation(format!("{} id should be an int!", label)).into_response();
            }
        }
    }
    next.run(req).await
}

/// For POST, PATCH and PUT the body must be a non-empty JSON object. The body is
/// buffered, checked and handed on with a JSON content type.
pub async fn validate_json_body(req: Request, next: Next) -> Response {
    if !matches!(*req.method(), Method::POST | Method::PATCH | Method::PUT) {
        return next.run(req).await;
    }
    let (mut parts, body) = req.into_parts();
    let bytes = match Bytes::from_request(Request::new(body), &()).await {
        Ok(b) => b,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            tracing::warn!(error = %rejection.body_text(), "request body over limit");
            return (StatusCode::PAYLOAD_TOO_LARGE, Json(error_body("Request body too large"))).into_response();
        }
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "failed to read request body");
            return AppError::Validation(INVALID_BODY.into()).into_response();
        }
    };
    if let Err(e) = parse_object(&bytes) {
        tracing::warn!(method = %parts.method, uri = %parts.uri, reason = %e, "rejected body");
        return e.into_response();
    }
    parts
        .headers
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

/// Wraps each request in a span carrying its id, and echoes the id back in `x-request-id`.
pub async fn request_id(req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %req.method(),
        uri = %req.uri(),
    );
    async move {
        let mut response = next.run(req).await;
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        tracing::info!(status = %response.status(), "request completed");
        response
    }
    .instrument(span)
    .await
}
