//! User-scoped workspace and template handlers.

use crate::config::{USERS, USER_TEMPLATE_FIELDS, USER_WORKSPACE_FIELDS, WORKSPACES};
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

#[derive(Debug, Deserialize)]
pub struct UserWorkspaceBody {
    pub name: String,
    #[serde(default, rename = "type")]
    pub workspace_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserTemplateBody {
    pub config: Value,
}

fn user_template_not_found(user_id: i64, workspace_id: i64, template_id: i64) -> AppError {
    AppError::NotFound(format!(
        "Template {} doesn't exist in workspace {} of user {}",
        template_id, workspace_id, user_id
    ))
}

/// GET /user/:user_id/workspace
pub async fn list_user_workspaces(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.pool.acquire().await?;
    let rows = AssociationService::user_workspaces(&mut conn, user_id).await?;
    if rows.is_empty() {
        return Err(AppError::NotFound("User doesn't have any workspaces yet".into()));
    }
    Ok(success_many(rows))
}

/// POST /user/:user_id/workspace — create the workspace, link it to the user and copy
/// the templates of same-typed workspaces into per-user rows, all in one transaction.
pub async fn create_user_workspace(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    JsonObject(body): JsonObject,
) -> Result<impl IntoResponse, AppError> {
    let parsed: UserWorkspaceBody = RequestValidator::parse(body.clone(), USER_WORKSPACE_FIELDS)?;
    let mut tx = state.pool.begin().await?;
    if !CrudService::exists(&mut tx, &USERS, user_id).await? {
        return Err(AppError::NotFound(USERS.not_found(user_id)));
    }
    let mut row = CrudService::create(&mut tx, &WORKSPACES, &body).await?;
    let workspace_id = row
        .get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| AppError::Db(sqlx::Error::RowNotFound))?;
    AssociationService::link_user(&mut tx, user_id, workspace_id).await?;
    let copied = match parsed.workspace_type.as_deref() {
        Some(ws_type) => AssociationService::propagate_templates(&mut tx, user_id, workspace_id, ws_type).await?,
        None => Vec::new(),
    };
    tx.commit().await?;
    tracing::info!(user_id, workspace_id, copied = copied.len(), "created user workspace");
    if let Value::Object(ref mut m) = row {
        m.insert("user_templates".into(), Value::Array(copied));
    }
    Ok(success_one(row))
}

/// DELETE /user/:user_id/workspace/:workspace_id — only a workspace linked to the user may be deleted.
pub async fn delete_user_workspace(
    State(state): State<AppState>,
    Path((user_id, workspace_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = state.pool.begin().await?;
    if !AssociationService::owns_workspace(&mut tx, user_id, workspace_id).await? {
        tracing::warn!(user_id, workspace_id, "workspace not owned by user");
        return Err(AppError::Ownership(format!(
            "Workspace {} does not belong to user {}",
            workspace_id, user_id
        )));
    }
    if CrudService::delete(&mut tx, &WORKSPACES, workspace_id).await?.is_none() {
        return Err(AppError::NotFound(WORKSPACES.not_found(workspace_id)));
    }
    tx.commit().await?;
    tracing::info!(user_id, workspace_id, "deleted user workspace");
    Ok(success_empty())
}

/// GET /user/:user_id/workspace/:workspace_id/template
pub async fn list_user_templates(
    State(state): State<AppState>,
    Path((user_id, workspace_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.pool.acquire().await?;
    let rows = AssociationService::user_templates(&mut conn, user_id, workspace_id).await?;
    if rows.is_empty() {
        return Err(AppError::NotFound("User doesn't have any templates yet".into()));
    }
    Ok(success_many(rows))
}

/// GET /user/:user_id/workspace/:workspace_id/template/:template_id
pub async fn get_user_template(
    State(state): State<AppState>,
    Path((user_id, workspace_id, template_id)): Path<(i64, i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.pool.acquire().await?;
    let row = AssociationService::user_template(&mut conn, user_id, workspace_id, template_id)
        .await?
        .ok_or_else(|| user_template_not_found(user_id, workspace_id, template_id))?;
    Ok(success_one_ok(row))
}

/// PATCH /user/:user_id/workspace/:workspace_id/template/:template_id — replaces only `config`.
pub async fn patch_user_template(
    State(state): State<AppState>,
    Path((user_id, workspace_id, template_id)): Path<(i64, i64, i64)>,
    JsonObject(body): JsonObject,
) -> Result<impl IntoResponse, AppError> {
    let parsed: UserTemplateBody = RequestValidator::parse(body, USER_TEMPLATE_FIELDS)?;
    let mut conn = state.pool.acquire().await?;
    let row = AssociationService::set_user_template_config(&mut conn, user_id, workspace_id, template_id, &parsed.config)
        .await?
        .ok_or_else(|| user_template_not_found(user_id, workspace_id, template_id))?;
    Ok(success_one_ok(row))
}

/// DELETE /user/:user_id/workspace/:workspace_id/template/:template_id — removes the per-user copy only.
pub async fn delete_user_template(
    State(state): State<AppState>,
    Path((user_id, workspace_id, template_id)): Path<(i64, i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.pool.acquire().await?;
    if !AssociationService::delete_user_template(&mut conn, user_id, workspace_id, template_id).await? {
        return Err(user_template_not_found(user_id, workspace_id, template_id));
    }
    Ok(success_empty())
}
