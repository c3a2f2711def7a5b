//! Typed bind values for document statements.

use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;

/// A value that can be bound to a document statement.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlParam {
    Uuid(uuid::Uuid),
    Text(String),
    TextArray(Vec<String>),
    Json(serde_json::Value),
}

/// Bind every parameter in order ($1, $2, ...).
pub fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &[SqlParam],
) -> Query<'q, Postgres, PgArguments> {
    for p in params {
        query = match p {
            SqlParam::Uuid(u) => query.bind(*u),
            SqlParam::Text(s) => query.bind(s.clone()),
            SqlParam::TextArray(v) => query.bind(v.clone()),
            SqlParam::Json(v) => query.bind(v.clone()),
        };
    }
    query
}
