//! Typed values that can be bound to a PostgreSQL query built at runtime.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::{Database, Type};
use uuid::Uuid;

/// A value bound to a `$n` placeholder. Each variant reports its own Postgres type
/// through `Encode::produces`, so one query can mix uuid, text and jsonb params.
#[derive(Clone, Debug, PartialEq)]
pub enum BindValue {
    Bool(bool),
    Text(String),
    Uuid(Uuid),
    UuidArray(Vec<Uuid>),
    Timestamp(DateTime<Utc>),
    Json(Value),
}

impl From<bool> for BindValue {
    fn from(b: bool) -> Self {
        BindValue::Bool(b)
    }
}

impl From<String> for BindValue {
    fn from(s: String) -> Self {
        BindValue::Text(s)
    }
}

impl From<&str> for BindValue {
    fn from(s: &str) -> Self {
        BindValue::Text(s.to_string())
    }
}

impl From<Uuid> for BindValue {
    fn from(u: Uuid) -> Self {
        BindValue::Uuid(u)
    }
}

impl From<Vec<Uuid>> for BindValue {
    fn from(v: Vec<Uuid>) -> Self {
        BindValue::UuidArray(v)
    }
}

impl From<DateTime<Utc>> for BindValue {
    fn from(t: DateTime<Utc>) -> Self {
        BindValue::Timestamp(t)
    }
}

impl From<Value> for BindValue {
    fn from(v: Value) -> Self {
        BindValue::Json(v)
    }
}

impl<'q> Encode<'q, Postgres> for BindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        match self {
            BindValue::Bool(b) => <bool as Encode<Postgres>>::encode_by_ref(b, buf),
            BindValue::Text(s) => <String as Encode<Postgres>>::encode_by_ref(s, buf),
            BindValue::Uuid(u) => <Uuid as Encode<Postgres>>::encode_by_ref(u, buf),
            BindValue::UuidArray(v) => <Vec<Uuid> as Encode<Postgres>>::encode_by_ref(v, buf),
            BindValue::Timestamp(t) => <DateTime<Utc> as Encode<Postgres>>::encode_by_ref(t, buf),
            BindValue::Json(v) => <Value as Encode<Postgres>>::encode_by_ref(v, buf),
        }
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        Some(match self {
            BindValue::Bool(_) => <bool as Type<Postgres>>::type_info(),
            BindValue::Text(_) => <String as Type<Postgres>>::type_info(),
            BindValue::Uuid(_) => <Uuid as Type<Postgres>>::type_info(),
            BindValue::UuidArray(_) => <Vec<Uuid> as Type<Postgres>>::type_info(),
            BindValue::Timestamp(_) => <DateTime<Utc> as Type<Postgres>>::type_info(),
            BindValue::Json(_) => <Value as Type<Postgres>>::type_info(),
        })
    }
}

impl Type<Postgres> for BindValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("TEXT")
    }

    fn compatible(_ty: &PgTypeInfo) -> bool {
        true
    }
}
