//! Operational routes: liveness, database readiness, build info.

use crate::response::{error_body, success_one_ok};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;

async fn health() -> impl IntoResponse {
    success_one_ok(json!({ "alive": true }))
}

async fn ready(State(state): State<AppState>) -> axum::response::Response {
    match sqlx::query("SELECT 1").fetch_optional(&state.pool).await {
        Ok(_) => success_one_ok(json!({ "database": "ok" })).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(error_body("database unavailable"))).into_response()
        }
    }
}

async fn version() -> impl IntoResponse {
    success_one_ok(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /health, GET /ready (runs `SELECT 1`), GET /version.
pub fn common_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .with_state(state)
}
