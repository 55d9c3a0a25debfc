//! Convert serde_json::Value to types that sqlx can bind.

use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::{Database, Type};

/// A value that can be bound to a PostgreSQL query. Converts from serde_json::Value;
/// ids bind as BIGINT, strings as TEXT, everything else as a JSONB document.
#[derive(Clone, Debug, PartialEq)]
pub enum PgBindValue {
    Null,
    I64(i64),
    String(String),
    Json(Value),
}

impl PgBindValue {
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => PgBindValue::Null,
            Value::Number(n) => match n.as_i64() {
                Some(i) => PgBindValue::I64(i),
                None => PgBindValue::Json(v.clone()),
            },
            Value::String(s) => PgBindValue::String(s.clone()),
            Value::Bool(_) | Value::Array(_) | Value::Object(_) => PgBindValue::Json(v.clone()),
        }
    }

    /// Like `from_json`, but scalars headed for a json/jsonb column stay JSON documents.
    pub fn for_column(v: &Value, pg_type: Option<&str>) -> Self {
        match (v, pg_type) {
            (Value::Null, _) => PgBindValue::Null,
            (_, Some("json" | "jsonb")) => PgBindValue::Json(v.clone()),
            _ => Self::from_json(v),
        }
    }
}

impl<'q> Encode<'q, Postgres> for PgBindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        Ok(match self {
            PgBindValue::Null => IsNull::Yes,
            PgBindValue::I64(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            PgBindValue::String(s) => {
                let s_ref: &str = s.as_str();
                <&str as Encode<Postgres>>::encode_by_ref(&s_ref, buf)?
            }
            PgBindValue::Json(v) => <Value as Encode<Postgres>>::encode_by_ref(v, buf)?,
        })
    }

    /// Declare the real parameter type per value so Postgres reads the binary encoding correctly.
    fn produces(&self) -> Option<PgTypeInfo> {
        Some(match self {
            PgBindValue::Null | PgBindValue::String(_) => <String as Type<Postgres>>::type_info(),
            PgBindValue::I64(_) => <i64 as Type<Postgres>>::type_info(),
            PgBindValue::Json(_) => <Value as Type<Postgres>>::type_info(),
        })
    }
}

impl Type<Postgres> for PgBindValue {
    fn type_info() -> PgTypeInfo {
        <String as Type<Postgres>>::type_info()
    }
}
