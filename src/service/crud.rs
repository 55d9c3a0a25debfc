//! Generic CRUD execution against PostgreSQL.
//!
//! Every method borrows a connection so callers decide the scope: a pooled
//! connection for single statements, a transaction for cascades.

use crate::config::EntitySchema;
use crate::error::AppError;
use crate::sql::{delete, delete_dependent, insert, select_by_id, select_list, update, PgBindValue, QueryBuf};
use serde_json::Value;
use sqlx::PgConnection;
use std::collections::HashMap;

pub struct CrudService;

impl CrudService {
    /// List rows with optional filters (exact match), limit (max 1000) and offset, ordered by id.
    pub async fn list(
        conn: &mut PgConnection,
        entity: &EntitySchema,
        filters: &[(String, Value)],
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Vec<Value>, AppError> {
        let q = select_list(entity, filters, limit, offset);
        Self::fetch_all(conn, &q).await
    }

    /// Fetch one row by primary key. Returns JSON object or None.
    pub async fn read(conn: &mut PgConnection, entity: &EntitySchema, id: i64) -> Result<Option<Value>, AppError> {
        let q = select_by_id(entity, id);
        Self::fetch_optional(conn, &q).await
    }

    pub async fn exists(conn: &mut PgConnection, entity: &EntitySchema, id: i64) -> Result<bool, AppError> {
        Ok(Self::read(conn, entity, id).await?.is_some())
    }

    /// Insert one row. A unique violation comes back as Conflict with the entity's reason.
    pub async fn create(
        conn: &mut PgConnection,
        entity: &EntitySchema,
        body: &HashMap<String, Value>,
    ) -> Result<Value, AppError> {
        let q = insert(entity, body);
        Self::fetch_optional(conn, &q)
            .await
            .map_err(|e| e.on_conflict(entity.conflict_reason))?
            .ok_or_else(|| AppError::Db(sqlx::Error::RowNotFound))
    }

    /// Full update of one row by id. Returns updated row, or None when the id is unknown.
    pub async fn update(
        conn: &mut PgConnection,
        entity: &EntitySchema,
        id: i64,
        body: &HashMap<String, Value>,
    ) -> Result<Option<Value>, AppError> {
        let q = update(entity, id, body);
        Self::fetch_optional(conn, &q)
            .await
            .map_err(|e| e.on_conflict(entity.conflict_reason))
    }

    /// Delete dependent association rows, then the row itself. Returns deleted row or None.
    /// Run inside a transaction so a missing row leaves the associations untouched.
    pub async fn delete(conn: &mut PgConnection, entity: &EntitySchema, id: i64) -> Result<Option<Value>, AppError> {
        for dep in entity.dependents {
            let removed = Self::execute(conn, &delete_dependent(dep, id)).await?;
            if removed > 0 {
                tracing::debug!(table = dep.table, id, removed, "cleared dependent rows");
            }
        }
        let q = delete(entity, id);
        Self::fetch_optional(conn, &q).await
    }

    pub async fn fetch_all(conn: &mut PgConnection, q: &QueryBuf) -> Result<Vec<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        let rows = query.fetch_all(&mut *conn).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    pub async fn fetch_optional(conn: &mut PgConnection, q: &QueryBuf) -> Result<Option<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        let row = query.fetch_optional(&mut *conn).await?;
        Ok(row.map(|r| row_to_json(&r)))
    }

    /// Run a statement and return the number of affected rows.
    pub async fn execute(conn: &mut PgConnection, q: &QueryBuf) -> Result<u64, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "execute");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        Ok(query.execute(&mut *conn).await?.rows_affected())
    }

    /// Build a query from hand-written SQL and JSON params.
    pub fn raw(sql: impl Into<String>, params: &[Value]) -> QueryBuf {
        QueryBuf {
            sql: sql.into(),
            params: params.iter().map(PgBindValue::from_json).collect(),
        }
    }
}

fn row_to_json(row: &sqlx::postgres::PgRow) -> Value {
    use sqlx::Column;
    use sqlx::Row;
    let mut map = serde_json::Map::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    Value::Object(map)
}

fn cell_to_value(row: &sqlx::postgres::PgRow, name: &str) -> Value {
    use sqlx::Row;
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<Value>, _>(name) {
        return j;
    }
    Value::Null
}
