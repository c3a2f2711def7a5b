//! Document store: the single persistence handle shared by every request.
//!
//! Documents are JSON objects kept per collection. The identifier lives outside
//! the document and is exposed to clients as `_id`.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{ensure_database_exists, PgDocumentStore};

use crate::error::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Field name under which the identifier is exposed.
pub const ID_FIELD: &str = "_id";

/// A stored document body (without its identifier).
pub type Document = Map<String, Value>;

/// Opaque store-assigned identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(uuid::Uuid);

impl DocumentId {
    pub fn new() -> Self {
        DocumentId(uuid::Uuid::new_v4())
    }

    /// Parse a client-supplied identifier. Rejects anything that is not a UUID.
    pub fn parse(s: &str) -> Result<Self, StoreError> {
        uuid::Uuid::parse_str(s.trim())
            .map(DocumentId)
            .map_err(|_| StoreError::InvalidId(s.to_string()))
    }

    pub fn as_uuid(&self) -> uuid::Uuid {
        self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<uuid::Uuid> for DocumentId {
    fn from(u: uuid::Uuid) -> Self {
        DocumentId(u)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Exact-match filter.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    All,
    Id(DocumentId),
    /// Compares the field's text form (strings as-is, numbers and booleans printed).
    FieldEq { field: String, value: String },
}

/// A find request: filter, projection, optional ascending sort.
#[derive(Clone, Debug, PartialEq)]
pub struct FindQuery {
    pub filter: Filter,
    pub exclude: Vec<String>,
    pub sort_by: Option<String>,
}

impl FindQuery {
    pub fn new(filter: Filter) -> Self {
        FindQuery {
            filter,
            exclude: Vec::new(),
            sort_by: None,
        }
    }

    pub fn excluding(mut self, fields: &[String]) -> Self {
        self.exclude = fields.to_vec();
        self
    }

    pub fn sorted_by(mut self, field: &str) -> Self {
        self.sort_by = Some(field.to_string());
        self
    }
}

/// Counts reported by an update. `matched` may be 1 while `modified` is 0 when
/// the new fields equal the stored ones.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateCounts {
    pub matched: u64,
    pub modified: u64,
}

/// Collection operations. One call per request operation; no multi-document transactions.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create the collection if needed and enforce uniqueness on `unique_fields`.
    async fn ensure_collection(&self, collection: &str, unique_fields: &[String]) -> Result<(), StoreError>;

    /// Matching documents with `_id` set, projection applied, in sort or insertion order.
    async fn find(&self, collection: &str, query: &FindQuery) -> Result<Vec<Document>, StoreError>;

    async fn insert_one(&self, collection: &str, doc: Document) -> Result<DocumentId, StoreError>;

    /// Merge `set` into the stored document (top-level fields replaced, others kept).
    async fn update_one(
        &self,
        collection: &str,
        id: DocumentId,
        set: Document,
    ) -> Result<UpdateCounts, StoreError>;

    /// Number of documents removed (0 or 1).
    async fn delete_one(&self, collection: &str, id: DocumentId) -> Result<u64, StoreError>;
}

/// Text form used by exact-match and sort, mirroring PostgreSQL's `->>` operator.
pub fn text_of(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Put the identifier in front of the body for the client.
pub fn with_id(id: DocumentId, doc: Document) -> Document {
    let mut out = Map::with_capacity(doc.len() + 1);
    out.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    out.extend(doc);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_uuid_and_rejects_garbage() {
        let id = DocumentId::new();
        assert_eq!(DocumentId::parse(&id.to_string()).ok(), Some(id));
        assert!(matches!(DocumentId::parse("123"), Err(StoreError::InvalidId(s)) if s == "123"));
        assert!(DocumentId::parse("").is_err());
    }

    #[test]
    fn text_of_follows_pg_text_extraction() {
        assert_eq!(text_of(&Value::String("19.90".into())), Some("19.90".into()));
        assert_eq!(text_of(&serde_json::json!(19.9)), Some("19.9".into()));
        assert_eq!(text_of(&serde_json::json!(true)), Some("true".into()));
        assert_eq!(text_of(&Value::Null), None);
    }

    #[test]
    fn with_id_sets_identifier_field() {
        let id = DocumentId::new();
        let mut doc = Document::new();
        doc.insert("nome".into(), Value::String("Combo X".into()));
        let out = with_id(id, doc);
        assert_eq!(out.get(ID_FIELD), Some(&Value::String(id.to_string())));
        assert_eq!(out.len(), 2);
    }
}
