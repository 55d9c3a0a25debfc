//! Test utilities for database-backed HTTP tests.

use axum_test::TestServer;
use sqlx::PgPool;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use workspace_registry::{app, ensure_tables, AppState};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Creates a uniquely named database next to `TEST_DATABASE_URL` and prepares the tables.
///
/// Returns `None` when `TEST_DATABASE_URL` is not set, so the calling test can skip.
pub async fn setup_test_db() -> Option<PgPool> {
    let Ok(base_url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set; skipping database test");
        return None;
    };

    let pid = std::process::id();
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let counter = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let db_name = format!("workspace_registry_test_{}_{}_{}", pid, timestamp, counter);

    let mut parsed_url = url::Url::parse(&base_url).expect("Invalid database URL");

    let admin_pool = PgPool::connect(&base_url)
        .await
        .expect("Failed to connect to test database");
    sqlx::query(&format!("CREATE DATABASE {}", db_name))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");
    admin_pool.close().await;

    parsed_url.set_path(&format!("/{}", db_name));
    let pool = PgPool::connect(parsed_url.as_str())
        .await
        .expect("Failed to connect to test database");
    ensure_tables(&pool).await.expect("Failed to create tables");
    Some(pool)
}

/// Full router over a fresh database, or `None` when no test database is configured.
pub async fn test_server() -> Option<(TestServer, PgPool)> {
    let pool = setup_test_db().await?;
    let server = TestServer::new(app(AppState::new(pool.clone()))).unwrap();
    Some((server, pool))
}
