//! Entity descriptors for users, workspaces and templates, plus the body rules of the association endpoints.

use crate::config::types::{ColumnInfo, Dependent, EntitySchema, FieldKind, FieldRule, Resource};

pub const NAME_MAX: usize = 100;
pub const TEMPLATE_TYPE_MAX: usize = 250;

pub const USERS: EntitySchema = EntitySchema {
    label: "User",
    table: "users",
    pk: "id",
    columns: &[
        ColumnInfo::key("id"),
        ColumnInfo::data("name", "varchar"),
        ColumnInfo::key("created_at"),
        ColumnInfo::key("updated_at"),
    ],
    fields: &[FieldRule::required("name", FieldKind::Text).max_length(NAME_MAX)],
    conflict_reason: "User with such name already exists",
    dependents: &[
        Dependent {
            table: "user_workspace_template",
            column: "user_id",
        },
        Dependent {
            table: "user_workspace",
            column: "user_id",
        },
    ],
};

pub const WORKSPACES: EntitySchema = EntitySchema {
    label: "Workspace",
    table: "workspace",
    pk: "id",
    columns: &[
        ColumnInfo::key("id"),
        ColumnInfo::data("name", "varchar"),
        ColumnInfo::data("type", "varchar"),
        ColumnInfo::key("created_at"),
        ColumnInfo::key("updated_at"),
    ],
    fields: &[
        FieldRule::required("name", FieldKind::Text).max_length(NAME_MAX),
        FieldRule::optional("type", FieldKind::Text).max_length(NAME_MAX),
        FieldRule::optional("template_types", FieldKind::TextList).max_length(TEMPLATE_TYPE_MAX),
    ],
    conflict_reason: "Workspace with such name already exists",
    dependents: &[
        Dependent {
            table: "user_workspace_template",
            column: "workspace_id",
        },
        Dependent {
            table: "workspace_template",
            column: "workspace_id",
        },
        Dependent {
            table: "user_workspace",
            column: "workspace_id",
        },
    ],
};

pub const TEMPLATES: EntitySchema = EntitySchema {
    label: "Template",
    table: "template",
    pk: "id",
    columns: &[
        ColumnInfo::key("id"),
        ColumnInfo::data("config", "jsonb"),
        ColumnInfo::data("type", "varchar"),
        ColumnInfo::key("created_at"),
        ColumnInfo::key("updated_at"),
    ],
    fields: &[
        FieldRule::required("config", FieldKind::Json),
        FieldRule::optional("type", FieldKind::Text).max_length(TEMPLATE_TYPE_MAX),
    ],
    conflict_reason: "Template with such type already exists",
    dependents: &[
        Dependent {
            table: "user_workspace_template",
            column: "template_id",
        },
        Dependent {
            table: "workspace_template",
            column: "template_id",
        },
    ],
};

/// POST /workspace/:workspace_id/link_template
pub const LINK_TEMPLATE_FIELDS: &[FieldRule] = &[FieldRule::required("template", FieldKind::Id)];

/// POST /user/:user_id/workspace
pub const USER_WORKSPACE_FIELDS: &[FieldRule] = &[
    FieldRule::required("name", FieldKind::Text).max_length(NAME_MAX),
    FieldRule::optional("type", FieldKind::Text).max_length(NAME_MAX),
];

/// PATCH /user/:user_id/workspace/:workspace_id/template/:template_id
pub const USER_TEMPLATE_FIELDS: &[FieldRule] = &[FieldRule::required("config", FieldKind::Json)];

pub enum Users {}
pub enum Workspaces {}
pub enum Templates {}

impl Resource for Users {
    const SCHEMA: &'static EntitySchema = &USERS;
}

impl Resource for Workspaces {
    const SCHEMA: &'static EntitySchema = &WORKSPACES;
}

impl Resource for Templates {
    const SCHEMA: &'static EntitySchema = &TEMPLATES;
}
