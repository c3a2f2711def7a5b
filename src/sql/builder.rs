//! Builds parameterized statements against document tables.
//!
//! Each collection is a table `(id UUID, doc JSONB, created_at, updated_at)`.
//! Schema, collection and field names come from resource definitions only;
//! client values always travel as parameters.

use super::params::SqlParam;
use crate::store::{Document, DocumentId, Filter, FindQuery};

/// Quote identifier for PostgreSQL.
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Quote a string literal (DDL cannot take parameters).
fn literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn qualified_table(schema: &str, collection: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(collection))
}

#[derive(Debug, Default)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl QueryBuf {
    fn push_param(&mut self, v: SqlParam) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

pub fn create_schema(schema: &str) -> String {
    format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(schema))
}

pub fn create_collection(schema: &str, collection: &str) -> String {
    format!(
        r#"CREATE TABLE IF NOT EXISTS {} (
    id UUID PRIMARY KEY,
    doc JSONB NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)"#,
        qualified_table(schema, collection)
    )
}

/// Name of the unique index on `field`; also used to recognise violations.
pub fn unique_index_name(collection: &str, field: &str) -> String {
    format!("{}_{}_key", collection, field)
}

pub fn create_unique_index(schema: &str, collection: &str, field: &str) -> String {
    format!(
        "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {} ((doc->>{}))",
        quoted(&unique_index_name(collection, field)),
        qualified_table(schema, collection),
        literal(field)
    )
}

/// SELECT id and (projected) doc. Unsorted finds come back in insertion order.
pub fn select(schema: &str, collection: &str, query: &FindQuery) -> QueryBuf {
    let mut q = QueryBuf::default();
    let doc_expr = if query.exclude.is_empty() {
        "doc".to_string()
    } else {
        let n = q.push_param(SqlParam::TextArray(query.exclude.clone()));
        format!("doc - ${}::text[] AS doc", n)
    };
    let where_clause = match &query.filter {
        Filter::All => String::new(),
        Filter::Id(id) => {
            let n = q.push_param(SqlParam::Uuid(id.as_uuid()));
            format!(" WHERE id = ${}", n)
        }
        Filter::FieldEq { field, value } => {
            let f = q.push_param(SqlParam::Text(field.clone()));
            let v = q.push_param(SqlParam::Text(value.clone()));
            format!(" WHERE doc->>${} = ${}", f, v)
        }
    };
    let order_by = match &query.sort_by {
        Some(field) => {
            let n = q.push_param(SqlParam::Text(field.clone()));
            format!(" ORDER BY doc->>${} COLLATE \"C\" ASC NULLS FIRST, created_at ASC", n)
        }
        None => " ORDER BY created_at ASC".to_string(),
    };
    q.sql = format!(
        "SELECT id, {} FROM {}{}{}",
        doc_expr,
        qualified_table(schema, collection),
        where_clause,
        order_by
    );
    q
}

pub fn insert(schema: &str, collection: &str, id: DocumentId, doc: &Document) -> QueryBuf {
    QueryBuf {
        sql: format!(
            "INSERT INTO {} (id, doc) VALUES ($1, $2)",
            qualified_table(schema, collection)
        ),
        params: vec![
            SqlParam::Uuid(id.as_uuid()),
            SqlParam::Json(serde_json::Value::Object(doc.clone())),
        ],
    }
}

/// Merge `set` into the stored doc. Returns one row: `matched`, `modified`.
/// A row whose merged doc equals the stored one is matched but not rewritten.
pub fn update(schema: &str, collection: &str, id: DocumentId, set: &Document) -> QueryBuf {
    let table = qualified_table(schema, collection);
    QueryBuf {
        sql: format!(
            r#"WITH target AS (
    SELECT id, doc FROM {table} WHERE id = $1 FOR UPDATE
), changed AS (
    UPDATE {table} AS t SET doc = t.doc || $2::jsonb, updated_at = NOW()
    FROM target
    WHERE t.id = target.id AND target.doc <> target.doc || $2::jsonb
    RETURNING t.id
)
SELECT (SELECT COUNT(*) FROM target) AS matched, (SELECT COUNT(*) FROM changed) AS modified"#,
            table = table
        ),
        params: vec![
            SqlParam::Uuid(id.as_uuid()),
            SqlParam::Json(serde_json::Value::Object(set.clone())),
        ],
    }
}

pub fn delete(schema: &str, collection: &str, id: DocumentId) -> QueryBuf {
    QueryBuf {
        sql: format!("DELETE FROM {} WHERE id = $1", qualified_table(schema, collection)),
        params: vec![SqlParam::Uuid(id.as_uuid())],
    }
}
