//! Shared application state for all routes.

use sqlx::PgPool;

/// Built once at startup and handed to the router with `with_state`.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        AppState { pool }
    }
}
