//! Descriptor types for the entity tables and the request bodies that write to them.

/// Shape a body field must have.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// JSON string. Non-empty when present.
    Text,
    /// Non-empty JSON object or array.
    Json,
    /// JSON integer, at least 1.
    Id,
    /// JSON array of non-empty strings.
    TextList,
}

#[derive(Clone, Copy, Debug)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub max_length: Option<usize>,
}

impl FieldRule {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        FieldRule {
            name,
            kind,
            required: true,
            max_length: None,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        FieldRule {
            name,
            kind,
            required: false,
            max_length: None,
        }
    }

    pub const fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ColumnInfo {
    pub name: &'static str,
    /// PostgreSQL type used as an explicit cast on bound parameters (e.g. `jsonb`).
    pub pg_type: Option<&'static str>,
    /// Written by INSERT/UPDATE from the request body. Id and timestamps are not.
    pub writable: bool,
}

impl ColumnInfo {
    pub const fn key(name: &'static str) -> Self {
        ColumnInfo {
            name,
            pg_type: None,
            writable: false,
        }
    }

    pub const fn data(name: &'static str, pg_type: &'static str) -> Self {
        ColumnInfo {
            name,
            pg_type: Some(pg_type),
            writable: true,
        }
    }
}

/// Association rows that reference an entity and must go before it does.
#[derive(Clone, Copy, Debug)]
pub struct Dependent {
    pub table: &'static str,
    pub column: &'static str,
}

#[derive(Clone, Copy, Debug)]
pub struct EntitySchema {
    /// Human label used in response reasons ("Template 3 doesn't exist").
    pub label: &'static str,
    pub table: &'static str,
    pub pk: &'static str,
    pub columns: &'static [ColumnInfo],
    /// Body rules for create and full update.
    pub fields: &'static [FieldRule],
    pub conflict_reason: &'static str,
    /// Deleted in order, inside the same transaction, before the entity row.
    pub dependents: &'static [Dependent],
}

impl EntitySchema {
    pub fn writable_columns(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns.iter().filter(|c| c.writable)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn not_found(&self, id: i64) -> String {
        format!("{} {} doesn't exist", self.label, id)
    }
}

/// Binds generic handlers to one entity table.
pub trait Resource: Send + Sync + 'static {
    const SCHEMA: &'static EntitySchema;
}
