//! Generic entity handlers: list, read, create, full update, cascading delete.
//!
//! Each handler is instantiated per entity through the `Resource` descriptor,
//! e.g. `get(entity::read::<Templates>)`.

use crate::config::{FieldKind, Resource};
use crate::error::AppError;
use crate::extractors::JsonObject;
use crate::response::{success_empty, success_many, success_one, success_one_ok};
use crate::service::{CrudService, RequestValidator};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde_json::Value;
use std::collections::HashMap;

/// `?limit=&offset=` plus exact-match filters on text columns (e.g. `?type=HW`).
pub(crate) fn list_params<R: Resource>(params: HashMap<String, String>) -> (Vec<(String, Value)>, Option<u32>, Option<u32>) {
    let mut limit = None;
    let mut offset = None;
    let mut filters = Vec::new();
    for (k, v) in params {
        match k.as_str() {
            "limit" => limit = v.parse().ok(),
            "offset" => offset = v.parse().ok(),
            _ => {
                let is_text = R::SCHEMA
                    .fields
                    .iter()
                    .any(|f| f.name == k && f.kind == FieldKind::Text);
                if is_text && R::SCHEMA.column(&k).is_some() {
                    filters.push((k, Value::String(v)));
                }
            }
        }
    }
    filters.sort_by(|a, b| a.0.cmp(&b.0));
    (filters, limit, offset)
}

pub async fn list<R: Resource>(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let (filters, limit, offset) = list_params::<R>(params);
    let mut conn = state.pool.acquire().await?;
    let rows = CrudService::list(&mut conn, R::SCHEMA, &filters, limit, offset).await?;
    Ok(success_many(rows))
}

pub async fn read<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.pool.acquire().await?;
    let row = CrudService::read(&mut conn, R::SCHEMA, id)
        .await?
        .ok_or_else(|| AppError::NotFound(R::SCHEMA.not_found(id)))?;
    Ok(success_one_ok(row))
}

pub async fn create<R: Resource>(
    State(state): State<AppState>,
    JsonObject(body): JsonObject,
) -> Result<impl IntoResponse, AppError> {
    RequestValidator::validate(&body, R::SCHEMA.fields)?;
    let mut conn = state.pool.acquire().await?;
    let row = CrudService::create(&mut conn, R::SCHEMA, &body).await?;
    tracing::info!(entity = R::SCHEMA.table, id = ?row.get("id"), "created");
    Ok(success_one(row))
}

pub async fn update<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonObject(body): JsonObject,
) -> Result<impl IntoResponse, AppError> {
    RequestValidator::validate(&body, R::SCHEMA.fields)?;
    let mut conn = state.pool.acquire().await?;
    let row = CrudService::update(&mut conn, R::SCHEMA, id, &body)
        .await?
        .ok_or_else(|| AppError::NotFound(R::SCHEMA.not_found(id)))?;
    Ok(success_one_ok(row))
}

/// Deletes dependent association rows and the entity row in one transaction.
pub async fn delete<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = state.pool.begin().await?;
    let deleted = CrudService::delete(&mut tx, R::SCHEMA, id).await?;
    if deleted.is_none() {
        tx.rollback().await?;
        return Err(AppError::NotFound(R::SCHEMA.not_found(id)));
    }
    tx.commit().await?;
    tracing::info!(entity = R::SCHEMA.table, id, "deleted");
    Ok(success_empty())
}
