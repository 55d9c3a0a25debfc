//! Link, cascade and propagation rules between users, workspaces and templates.
//!
//! Multi-statement operations expect to run inside a transaction opened by the caller.

use crate::error::AppError;
use crate::service::CrudService;
use crate::sql::{PgBindValue, QueryBuf};
use serde_json::{json, Value};
use sqlx::PgConnection;

const TEMPLATE_COLUMNS: &str = r#"t."id", t."config", t."type", t."created_at", t."updated_at""#;
const WORKSPACE_COLUMNS: &str = r#"w."id", w."name", w."type", w."created_at", w."updated_at""#;
const USER_TEMPLATE_COLUMNS: &str = r#""id", "user_id", "workspace_id", "template_id", "config""#;

pub struct AssociationService;

impl AssociationService {
    pub async fn template_id_by_type(conn: &mut PgConnection, template_type: &str) -> Result<Option<i64>, AppError> {
        let q = CrudService::raw(r#"SELECT "id" FROM "template" WHERE "type" = $1"#, &[json!(template_type)]);
        Ok(CrudService::fetch_optional(conn, &q)
            .await?
            .and_then(|row| row.get("id").and_then(Value::as_i64)))
    }

    /// Insert one workspace_template link. An existing link is a Conflict.
    pub async fn link_template(conn: &mut PgConnection, workspace_id: i64, template_id: i64) -> Result<Value, AppError> {
        let q = CrudService::raw(
            r#"INSERT INTO "workspace_template" ("workspace_id", "template_id") VALUES ($1, $2) RETURNING "workspace_id", "template_id""#,
            &[json!(workspace_id), json!(template_id)],
        );
        CrudService::fetch_optional(conn, &q)
            .await
            .map_err(|e| {
                e.on_conflict(format!(
                    "Template {} is already linked to workspace {}",
                    template_id, workspace_id
                ))
                .on_referential(format!(
                    "Workspace {} or template {} doesn't exist",
                    workspace_id, template_id
                ))
            })?
            .ok_or_else(|| AppError::Db(sqlx::Error::RowNotFound))
    }

    /// Link every requested template type to the workspace. Each explicit type must exist;
    /// the workspace's own type is linked only when a template of that type exists.
    /// Returns the linked template ids in request order.
    pub async fn link_template_types(
        conn: &mut PgConnection,
        workspace_id: i64,
        workspace_type: Option<&str>,
        template_types: &[String],
    ) -> Result<Vec<i64>, AppError> {
        let mut template_ids: Vec<i64> = Vec::new();
        for template_type in template_types {
            let id = Self::template_id_by_type(conn, template_type)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Template with type '{}' doesn't exist", template_type)))?;
            if !template_ids.contains(&id) {
                template_ids.push(id);
            }
        }
        if let Some(ws_type) = workspace_type {
            if let Some(id) = Self::template_id_by_type(conn, ws_type).await? {
                if !template_ids.contains(&id) {
                    template_ids.push(id);
                }
            }
        }
        for template_id in &template_ids {
            Self::link_template(conn, workspace_id, *template_id).await?;
        }
        tracing::debug!(workspace_id, linked = template_ids.len(), "linked templates");
        Ok(template_ids)
    }

    /// Drop all links of the workspace and link the requested set instead.
    pub async fn replace_template_links(
        conn: &mut PgConnection,
        workspace_id: i64,
        workspace_type: Option<&str>,
        template_types: &[String],
    ) -> Result<Vec<i64>, AppError> {
        let q = CrudService::raw(
            r#"DELETE FROM "workspace_template" WHERE "workspace_id" = $1"#,
            &[json!(workspace_id)],
        );
        let removed = CrudService::execute(conn, &q).await?;
        tracing::debug!(workspace_id, removed, "cleared template links");
        Self::link_template_types(conn, workspace_id, workspace_type, template_types).await
    }

    pub async fn workspace_templates(conn: &mut PgConnection, workspace_id: i64) -> Result<Vec<Value>, AppError> {
        let q = CrudService::raw(
            format!(
                r#"SELECT {} FROM "template" t JOIN "workspace_template" wt ON wt."template_id" = t."id" WHERE wt."workspace_id" = $1 ORDER BY t."id""#,
                TEMPLATE_COLUMNS
            ),
            &[json!(workspace_id)],
        );
        CrudService::fetch_all(conn, &q).await
    }

    pub async fn unlink_template(conn: &mut PgConnection, workspace_id: i64, template_id: i64) -> Result<bool, AppError> {
        let q = CrudService::raw(
            r#"DELETE FROM "workspace_template" WHERE "workspace_id" = $1 AND "template_id" = $2"#,
            &[json!(workspace_id), json!(template_id)],
        );
        Ok(CrudService::execute(conn, &q).await? > 0)
    }

    pub async fn link_user(conn: &mut PgConnection, user_id: i64, workspace_id: i64) -> Result<Value, AppError> {
        let q = CrudService::raw(
            r#"INSERT INTO "user_workspace" ("user_id", "workspace_id") VALUES ($1, $2) RETURNING "id", "user_id", "workspace_id""#,
            &[json!(user_id), json!(workspace_id)],
        );
        CrudService::fetch_optional(conn, &q)
            .await
            .map_err(|e| {
                e.on_conflict(format!("Workspace {} is already linked to user {}", workspace_id, user_id))
                    .on_referential(format!("User {} doesn't exist", user_id))
            })?
            .ok_or_else(|| AppError::Db(sqlx::Error::RowNotFound))
    }

    /// Snapshot the config of every template linked to a workspace of `workspace_type`
    /// into user_workspace_template rows for (user, workspace). Later template edits do not propagate.
    pub async fn propagate_templates(
        conn: &mut PgConnection,
        user_id: i64,
        workspace_id: i64,
        workspace_type: &str,
    ) -> Result<Vec<Value>, AppError> {
        let q = CrudService::raw(
            format!(
                r#"INSERT INTO "user_workspace_template" ("user_id", "workspace_id", "template_id", "config")
                SELECT $1, $2, t."id", t."config" FROM "template" t
                WHERE t."id" IN (
                    SELECT wt."template_id" FROM "workspace_template" wt
                    JOIN "workspace" w ON w."id" = wt."workspace_id"
                    WHERE w."type" = $3
                )
                ORDER BY t."id"
                RETURNING {}"#,
                USER_TEMPLATE_COLUMNS
            ),
            &[json!(user_id), json!(workspace_id), json!(workspace_type)],
        );
        let rows = CrudService::fetch_all(conn, &q)
            .await
            .map_err(|e| e.on_conflict(format!("Workspace {} already has templates for user {}", workspace_id, user_id)))?;
        tracing::debug!(user_id, workspace_id, workspace_type, copied = rows.len(), "propagated templates");
        Ok(rows)
    }

    pub async fn user_workspaces(conn: &mut PgConnection, user_id: i64) -> Result<Vec<Value>, AppError> {
        let q = CrudService::raw(
            format!(
                r#"SELECT {} FROM "workspace" w JOIN "user_workspace" uw ON uw."workspace_id" = w."id" WHERE uw."user_id" = $1 ORDER BY w."id""#,
                WORKSPACE_COLUMNS
            ),
            &[json!(user_id)],
        );
        CrudService::fetch_all(conn, &q).await
    }

    pub async fn owns_workspace(conn: &mut PgConnection, user_id: i64, workspace_id: i64) -> Result<bool, AppError> {
        let q = CrudService::raw(
            r#"SELECT "id" FROM "user_workspace" WHERE "user_id" = $1 AND "workspace_id" = $2"#,
            &[json!(user_id), json!(workspace_id)],
        );
        Ok(CrudService::fetch_optional(conn, &q).await?.is_some())
    }

    pub async fn user_templates(conn: &mut PgConnection, user_id: i64, workspace_id: i64) -> Result<Vec<Value>, AppError> {
        let q = CrudService::raw(
            format!(
                r#"SELECT {} FROM "user_workspace_template" WHERE "user_id" = $1 AND "workspace_id" = $2 ORDER BY "template_id""#,
                USER_TEMPLATE_COLUMNS
            ),
            &[json!(user_id), json!(workspace_id)],
        );
        CrudService::fetch_all(conn, &q).await
    }

    pub async fn user_template(
        conn: &mut PgConnection,
        user_id: i64,
        workspace_id: i64,
        template_id: i64,
    ) -> Result<Option<Value>, AppError> {
        let q = CrudService::raw(
            format!(
                r#"SELECT {} FROM "user_workspace_template" WHERE "user_id" = $1 AND "workspace_id" = $2 AND "template_id" = $3"#,
                USER_TEMPLATE_COLUMNS
            ),
            &[json!(user_id), json!(workspace_id), json!(template_id)],
        );
        CrudService::fetch_optional(conn, &q).await
    }

    /// Replace only the config of one per-user template copy.
    pub async fn set_user_template_config(
        conn: &mut PgConnection,
        user_id: i64,
        workspace_id: i64,
        template_id: i64,
        config: &Value,
    ) -> Result<Option<Value>, AppError> {
        let q = QueryBuf {
            sql: format!(
                r#"UPDATE "user_workspace_template" SET "config" = $4::jsonb WHERE "user_id" = $1 AND "workspace_id" = $2 AND "template_id" = $3 RETURNING {}"#,
                USER_TEMPLATE_COLUMNS
            ),
            params: vec![
                PgBindValue::I64(user_id),
                PgBindValue::I64(workspace_id),
                PgBindValue::I64(template_id),
                PgBindValue::for_column(config, Some("jsonb")),
            ],
        };
        CrudService::fetch_optional(conn, &q).await
    }

    pub async fn delete_user_template(
        conn: &mut PgConnection,
        user_id: i64,
        workspace_id: i64,
        template_id: i64,
    ) -> Result<bool, AppError> {
        let q = CrudService::raw(
            r#"DELETE FROM "user_workspace_template" WHERE "user_id" = $1 AND "workspace_id" = $2 AND "template_id" = $3"#,
            &[json!(user_id), json!(workspace_id), json!(template_id)],
        );
        Ok(CrudService::execute(conn, &q).await? > 0)
    }
}
