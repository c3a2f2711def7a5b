//! PostgreSQL-backed document store. Every collection is a JSONB table in one schema.

use super::{with_id, Document, DocumentId, DocumentStore, FindQuery, UpdateCounts};
use crate::error::{ConfigError, StoreError};
use crate::sql::{self, bind_params, QueryBuf};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{ConnectOptions, PgPool, Row};
use std::str::FromStr;

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
    schema: String,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        PgDocumentStore {
            pool,
            schema: schema.into(),
        }
    }

    async fn execute(&self, q: &QueryBuf) -> Result<u64, sqlx::Error> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let done = bind_params(sqlx::query(&q.sql), &q.params)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }

    /// Turn a unique-index violation into `Duplicate`, keeping the offending value from `doc`.
    fn map_write_error(&self, collection: &str, doc: &Document, e: sqlx::Error) -> StoreError {
        if let sqlx::Error::Database(db) = &e {
            if db.code().as_deref() == Some("23505") {
                let field = db.constraint().and_then(|c| constrained_field(collection, c, doc));
                if let Some(field) = field {
                    return StoreError::Duplicate {
                        collection: collection.to_string(),
                        value: doc.get(&field).cloned().unwrap_or_default(),
                        field,
                    };
                }
            }
        }
        StoreError::Db(e)
    }
}

/// The written field whose unique index is named `constraint`.
fn constrained_field(collection: &str, constraint: &str, doc: &Document) -> Option<String> {
    doc.keys()
        .find(|field| sql::unique_index_name(collection, field) == constraint)
        .cloned()
}

fn row_to_document(row: &sqlx::postgres::PgRow) -> Result<Document, StoreError> {
    let id: uuid::Uuid = row.try_get("id")?;
    match row.try_get::<Value, _>("doc")? {
        Value::Object(doc) => Ok(with_id(DocumentId::from(id), doc)),
        other => Err(StoreError::Corrupt(format!("document {} is not an object: {}", id, other))),
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn ensure_collection(&self, collection: &str, unique_fields: &[String]) -> Result<(), StoreError> {
        let mut ddl = vec![
            sql::create_schema(&self.schema),
            sql::create_collection(&self.schema, collection),
        ];
        ddl.extend(
            unique_fields
                .iter()
                .map(|field| sql::create_unique_index(&self.schema, collection, field)),
        );
        for statement in ddl {
            tracing::debug!(sql = %statement, "ddl");
            sqlx::query(&statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn find(&self, collection: &str, query: &FindQuery) -> Result<Vec<Document>, StoreError> {
        let q = sql::select(&self.schema, collection, query);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = bind_params(sqlx::query(&q.sql), &q.params)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_document).collect()
    }

    async fn insert_one(&self, collection: &str, doc: Document) -> Result<DocumentId, StoreError> {
        let id = DocumentId::new();
        let q = sql::insert(&self.schema, collection, id, &doc);
        self.execute(&q)
            .await
            .map_err(|e| self.map_write_error(collection, &doc, e))?;
        Ok(id)
    }

    async fn update_one(
        &self,
        collection: &str,
        id: DocumentId,
        set: Document,
    ) -> Result<UpdateCounts, StoreError> {
        let q = sql::update(&self.schema, collection, id, &set);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = bind_params(sqlx::query(&q.sql), &q.params)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| self.map_write_error(collection, &set, e))?;
        let matched: i64 = row.try_get("matched")?;
        let modified: i64 = row.try_get("modified")?;
        Ok(UpdateCounts {
            matched: matched.max(0) as u64,
            modified: modified.max(0) as u64,
        })
    }

    async fn delete_one(&self, collection: &str, id: DocumentId) -> Result<u64, StoreError> {
        let q = sql::delete(&self.schema, collection, id);
        Ok(self.execute(&q).await?)
    }
}

/// Create the database named in `database_url` if it does not exist (connects to `postgres` to do so).
pub async fn ensure_database_exists(database_url: &str) -> Result<(), StoreError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), ConfigError> {
    let scheme_end = url.find("://").map(|i| i + 3).unwrap_or(0);
    let path_start = url
        .get(scheme_end..)
        .and_then(|rest| rest.find('/'))
        .map(|i| scheme_end + i + 1)
        .ok_or_else(|| ConfigError::InvalidDatabaseUrl(format!("no database path in {}", url)))?;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let mut parts = path_and_query.splitn(2, '?');
    let db_name = parts.next().unwrap_or("").trim().to_string();
    let query = parts.next().map(|q| format!("?{}", q)).unwrap_or_default();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres{}", base, query), db_name))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_url_swaps_database_and_keeps_query() {
        let (admin, db) = parse_db_name_from_url("postgres://u:p@localhost:5432/hamburgueria?sslmode=disable")
            .unwrap_or_default();
        assert_eq!(admin, "postgres://u:p@localhost:5432/postgres?sslmode=disable");
        assert_eq!(db, "hamburgueria");
    }

    #[test]
    fn url_without_path_is_rejected() {
        assert!(matches!(
            parse_db_name_from_url("postgres://localhost"),
            Err(ConfigError::InvalidDatabaseUrl(_))
        ));
    }

    #[test]
    fn unique_violation_names_the_written_field() {
        let mut doc = Document::new();
        doc.insert("nome".into(), Value::from("Combo X"));
        doc.insert("preco".into(), Value::from("19.90"));
        assert_eq!(constrained_field("produtos", "produtos_nome_key", &doc).as_deref(), Some("nome"));
        assert_eq!(constrained_field("usuarios", "produtos_nome_key", &doc), None);
        assert_eq!(constrained_field("produtos", "produtos_pkey", &doc), None);
    }

    #[test]
    fn ident_quoting_doubles_quotes() {
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }
}
