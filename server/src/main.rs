//! Workspace registry server.
//!
//! Run from repo root: `cargo run -p workspace-registry-server`
//! Settings come from the environment (or `.env`): DATABASE_URL, BIND_ADDR,
//! MAX_CONNECTIONS, ACQUIRE_TIMEOUT_SECS, SEED_SAMPLE_DATA, RESET_SCHEMA.

use tokio::net::TcpListener;
use workspace_registry::{
    app, drop_tables, ensure_database_exists, ensure_tables, seed_sample_data, AppState, Settings,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("workspace_registry=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    ensure_database_exists(&settings.database_url).await?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout)
        .connect(&settings.database_url)
        .await?;

    if settings.reset_schema {
        drop_tables(&pool).await?;
    }
    ensure_tables(&pool).await?;
    if settings.seed_sample_data {
        seed_sample_data(&pool).await?;
    }

    let router = app(AppState::new(pool.clone()));
    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("workspace registry listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
