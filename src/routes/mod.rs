//! Router assembly.

mod api;
mod common;

pub use api::api_routes;
pub use common::common_routes;

use crate::middleware::request_id;
use crate::state::AppState;
use axum::{middleware, Router};
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;

/// Largest accepted request body.
pub const BODY_LIMIT: usize = 1024 * 1024;

/// Full application: API and operational routes behind the request-id span and body limit.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(api_routes(state))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id))
                .layer(RequestBodyLimitLayer::new(BODY_LIMIT)),
        )
}
