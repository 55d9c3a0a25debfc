//! Builds parameterized INSERT, SELECT, UPDATE, DELETE from an entity descriptor.

use crate::config::{Dependent, EntitySchema};
use crate::sql::PgBindValue;
use serde_json::Value;
use std::collections::HashMap;

/// Quote identifier for PostgreSQL (safe: only from descriptors).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: PgBindValue) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }
}

fn placeholder(param_num: u32, pg_type: Option<&str>) -> String {
    pg_type
        .map(|t| format!("${}::{}", param_num, t))
        .unwrap_or_else(|| format!("${}", param_num))
}

/// SELECT list: every descriptor column, in declaration order.
pub fn select_column_list(entity: &EntitySchema) -> String {
    entity
        .columns
        .iter()
        .map(|c| quoted(c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// SELECT by primary key. Caller binds the id as sole param.
pub fn select_by_id(entity: &EntitySchema, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.push_param(PgBindValue::I64(id));
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = $1",
        select_column_list(entity),
        quoted(entity.table),
        quoted(entity.pk)
    );
    q
}

/// SELECT list with optional filters (exact match per column), ORDER BY pk, optional LIMIT/OFFSET.
/// Filters on unknown columns are dropped; params are bound in filter order.
pub fn select_list(
    entity: &EntitySchema,
    filters: &[(String, Value)],
    limit: Option<u32>,
    offset: Option<u32>,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut where_parts = Vec::new();
    for (col, val) in filters {
        let Some(c) = entity.column(col) else { continue };
        let param_num = q.push_param(PgBindValue::for_column(val, c.pg_type));
        where_parts.push(format!("{} = {}", quoted(c.name), placeholder(param_num, c.pg_type)));
    }
    let where_clause = if where_parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", where_parts.join(" AND "))
    };
    let limit_clause = limit.map(|n| format!(" LIMIT {}", n.min(1000))).unwrap_or_default();
    let offset_clause = offset.map(|n| format!(" OFFSET {}", n)).unwrap_or_default();
    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY {}{}{}",
        select_column_list(entity),
        quoted(entity.table),
        where_clause,
        quoted(entity.pk),
        limit_clause,
        offset_clause
    );
    q
}

/// INSERT every writable column; a column missing from the body is written as NULL.
pub fn insert(entity: &EntitySchema, body: &HashMap<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in entity.writable_columns() {
        let val = body.get(c.name).unwrap_or(&Value::Null);
        let param_num = q.push_param(PgBindValue::for_column(val, c.pg_type));
        cols.push(quoted(c.name));
        placeholders.push(placeholder(param_num, c.pg_type));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        quoted(entity.table),
        cols.join(", "),
        placeholders.join(", "),
        select_column_list(entity)
    );
    q
}

/// UPDATE by id as a full replacement: every writable column is set, missing ones to NULL.
pub fn update(entity: &EntitySchema, id: i64, body: &HashMap<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for c in entity.writable_columns() {
        let val = body.get(c.name).unwrap_or(&Value::Null);
        let param_num = q.push_param(PgBindValue::for_column(val, c.pg_type));
        sets.push(format!("{} = {}", quoted(c.name), placeholder(param_num, c.pg_type)));
    }
    if entity.column("updated_at").is_some() {
        sets.push(format!("{} = NOW()", quoted("updated_at")));
    }
    let id_param = q.push_param(PgBindValue::I64(id));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ${} RETURNING {}",
        quoted(entity.table),
        sets.join(", "),
        quoted(entity.pk),
        id_param,
        select_column_list(entity)
    );
    q
}

/// DELETE by id.
pub fn delete(entity: &EntitySchema, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.push_param(PgBindValue::I64(id));
    q.sql = format!(
        "DELETE FROM {} WHERE {} = $1 RETURNING {}",
        quoted(entity.table),
        quoted(entity.pk),
        select_column_list(entity)
    );
    q
}

/// DELETE association rows pointing at `id`.
pub fn delete_dependent(dep: &Dependent, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.push_param(PgBindValue::I64(id));
    q.sql = format!("DELETE FROM {} WHERE {} = $1", quoted(dep.table), quoted(dep.column));
    q
}
