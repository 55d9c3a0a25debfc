//! Table DDL, database bootstrap and optional sample data.

use sqlx::ConnectOptions;
use sqlx::PgPool;
use std::str::FromStr;

/// Entity tables first, association tables after, so FKs resolve in order.
const TABLES_DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        name VARCHAR(100) NOT NULL UNIQUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS workspace (
        id BIGSERIAL PRIMARY KEY,
        name VARCHAR(100) NOT NULL UNIQUE,
        type VARCHAR(100),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS template (
        id BIGSERIAL PRIMARY KEY,
        config JSONB NOT NULL,
        type VARCHAR(250) UNIQUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS workspace_template (
        workspace_id BIGINT NOT NULL REFERENCES workspace (id),
        template_id BIGINT NOT NULL REFERENCES template (id),
        PRIMARY KEY (workspace_id, template_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS user_workspace (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL REFERENCES users (id),
        workspace_id BIGINT NOT NULL REFERENCES workspace (id),
        UNIQUE (user_id, workspace_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS user_workspace_template (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL REFERENCES users (id),
        workspace_id BIGINT NOT NULL REFERENCES workspace (id),
        template_id BIGINT NOT NULL REFERENCES template (id),
        config JSONB,
        UNIQUE (user_id, workspace_id, template_id)
    )
    "#,
];

/// Reverse of creation order.
const TABLE_NAMES: &[&str] = &[
    "user_workspace_template",
    "user_workspace",
    "workspace_template",
    "template",
    "workspace",
    "users",
];

/// Create the six tables if they do not exist yet. Safe to call on every boot.
pub async fn ensure_tables(pool: &PgPool) -> Result<(), sqlx::Error> {
    for ddl in TABLES_DDL {
        sqlx::query(ddl).execute(pool).await?;
    }
    tracing::info!(tables = TABLE_NAMES.len(), "schema ready");
    Ok(())
}

/// Drop every table with its data.
pub async fn drop_tables(pool: &PgPool) -> Result<(), sqlx::Error> {
    for table in TABLE_NAMES {
        sqlx::query(&format!("DROP TABLE IF EXISTS {} CASCADE", quote_ident(table)))
            .execute(pool)
            .await?;
    }
    tracing::warn!("schema dropped");
    Ok(())
}

/// Two workspaces, two templates and two users. Rows that already exist are left alone.
pub async fn seed_sample_data(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for (name, kind) in [("Office workspace", "OW"), ("Home workspace", "HW")] {
        sqlx::query("INSERT INTO workspace (name, type) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(name)
            .bind(kind)
            .execute(&mut *tx)
            .await?;
    }
    let templates = [
        (serde_json::json!([{ "key": "value" }]), "Office"),
        (serde_json::json!([{ "another_key": "different_value" }]), "Home"),
    ];
    for (config, kind) in templates {
        sqlx::query("INSERT INTO template (config, type) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(config)
            .bind(kind)
            .execute(&mut *tx)
            .await?;
    }
    for name in ["John", "Alex"] {
        sqlx::query("INSERT INTO users (name) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(name)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    tracing::info!("sample data seeded");
    Ok(())
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
        tracing::info!(database = %db_name, "created database");
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), sqlx::Error> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| sqlx::Error::Configuration("DATABASE_URL: no path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    let admin_url = format!("{}postgres", base);
    Ok((admin_url, db_name.to_string()))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
