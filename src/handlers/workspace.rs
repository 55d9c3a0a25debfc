//! Workspace handlers that go beyond generic CRUD: create and update with template links,
//! explicit linking, and link listing.

use crate::config::{LINK_TEMPLATE_FIELDS, TEMPLATES, WORKSPACES};
use crate::error::AppError;
use crate::extractors::JsonObject;
use crate::response::{success_empty, success_many, success_one, success_one_ok};
use crate::service::{AssociationService, CrudService, RequestValidator};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
pub struct WorkspaceBody {
    pub name: String,
    #[serde(default, rename = "type")]
    pub workspace_type: Option<String>,
    #[serde(default)]
    pub template_types: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct LinkTemplateBody {
    pub template: i64,
}

fn with_templates(mut row: Value, template_ids: Vec<i64>) -> Value {
    if let Value::Object(ref mut m) = row {
        m.insert("templates".into(), Value::from(template_ids));
    }
    row
}

/// POST /workspace — insert the workspace and link requested templates in one transaction.
pub async fn create_workspace(
    State(state): State<AppState>,
    JsonObject(body): JsonObject,
) -> Result<impl IntoResponse, AppError> {
    let parsed: WorkspaceBody = RequestValidator::parse(body.clone(), WORKSPACES.fields)?;
    let mut tx = state.pool.begin().await?;
    let row = CrudService::create(&mut tx, &WORKSPACES, &body).await?;
    let workspace_id = row
        .get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| AppError::Db(sqlx::Error::RowNotFound))?;
    let template_ids = AssociationService::link_template_types(
        &mut tx,
        workspace_id,
        parsed.workspace_type.as_deref(),
        parsed.template_types.as_deref().unwrap_or_default(),
    )
    .await?;
    tx.commit().await?;
    tracing::info!(workspace_id, linked = template_ids.len(), "created workspace");
    Ok(success_one(with_templates(row, template_ids)))
}

/// PATCH /workspace/:workspace_id — full update; `template_types`, when given, replaces the link set.
pub async fn update_workspace(
    State(state): State<AppState>,
    Path(workspace_id): Path<i64>,
    JsonObject(body): JsonObject,
) -> Result<impl IntoResponse, AppError> {
    let parsed: WorkspaceBody = RequestValidator::parse(body.clone(), WORKSPACES.fields)?;
    let mut tx = state.pool.begin().await?;
    let row = CrudService::update(&mut tx, &WORKSPACES, workspace_id, &body)
        .await?
        .ok_or_else(|| AppError::NotFound(WORKSPACES.not_found(workspace_id)))?;
    let row = match parsed.template_types {
        Some(types) => {
            let ids = AssociationService::replace_template_links(
                &mut tx,
                workspace_id,
                parsed.workspace_type.as_deref(),
                &types,
            )
            .await?;
            with_templates(row, ids)
        }
        None => row,
    };
    tx.commit().await?;
    Ok(success_one_ok(row))
}

/// POST /workspace/:workspace_id/link_template — body `{"template": id}` (`template_id` also accepted).
pub async fn link_template(
    State(state): State<AppState>,
    Path(workspace_id): Path<i64>,
    JsonObject(mut body): JsonObject,
) -> Result<impl IntoResponse, AppError> {
    normalize_template_key(&mut body);
    let parsed: LinkTemplateBody = RequestValidator::parse(body, LINK_TEMPLATE_FIELDS)?;
    let mut conn = state.pool.acquire().await?;
    if !CrudService::exists(&mut conn, &WORKSPACES, workspace_id).await? {
        return Err(AppError::NotFound(WORKSPACES.not_found(workspace_id)));
    }
    if !CrudService::exists(&mut conn, &TEMPLATES, parsed.template).await? {
        return Err(AppError::NotFound(TEMPLATES.not_found(parsed.template)));
    }
    let link = AssociationService::link_template(&mut conn, workspace_id, parsed.template).await?;
    Ok(success_one(link))
}

fn normalize_template_key(body: &mut HashMap<String, Value>) {
    if !body.contains_key("template") {
        if let Some(v) = body.remove("template_id") {
            body.insert("template".into(), v);
        }
    }
}

/// GET /workspace/:workspace_id/template
pub async fn list_workspace_templates(
    State(state): State<AppState>,
    Path(workspace_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.pool.acquire().await?;
    if !CrudService::exists(&mut conn, &WORKSPACES, workspace_id).await? {
        return Err(AppError::NotFound(WORKSPACES.not_found(workspace_id)));
    }
    let rows = AssociationService::workspace_templates(&mut conn, workspace_id).await?;
    Ok(success_many(rows))
}

/// DELETE /workspace/:workspace_id/template/:template_id
pub async fn unlink_template(
    State(state): State<AppState>,
    Path((workspace_id, template_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.pool.acquire().await?;
    if !AssociationService::unlink_template(&mut conn, workspace_id, template_id).await? {
        return Err(AppError::NotFound(format!(
            "Template {} is not linked to workspace {}",
            template_id, workspace_id
        )));
    }
    Ok(success_empty())
}
