//! In-process document store. Used when no database is configured and by the tests.

use super::{text_of, with_id, Document, DocumentId, DocumentStore, Filter, FindQuery, UpdateCounts};
use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Default)]
struct Collection {
    unique_fields: Vec<String>,
    /// Insertion order is the natural order returned by unsorted finds.
    docs: Vec<(DocumentId, Document)>,
}

impl Collection {
    fn matches(filter: &Filter, id: &DocumentId, doc: &Document) -> bool {
        match filter {
            Filter::All => true,
            Filter::Id(wanted) => wanted == id,
            Filter::FieldEq { field, value } => {
                doc.get(field).and_then(text_of).as_deref() == Some(value.as_str())
            }
        }
    }

    /// First unique field whose value `doc` would share with a document other than `skip`.
    fn conflict(&self, doc: &Document, skip: Option<DocumentId>) -> Option<String> {
        self.unique_fields.iter().find_map(|field| {
            let wanted = doc.get(field).and_then(text_of)?;
            let taken = self.docs.iter().any(|(id, other)| {
                Some(*id) != skip && other.get(field).and_then(text_of).as_deref() == Some(wanted.as_str())
            });
            taken.then(|| field.clone())
        })
    }
}

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("memory store lock poisoned".into())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ensure_collection(&self, collection: &str, unique_fields: &[String]) -> Result<(), StoreError> {
        let mut guard = self.collections.write().map_err(|_| poisoned())?;
        let entry = guard.entry(collection.to_string()).or_default();
        for field in unique_fields {
            if !entry.unique_fields.contains(field) {
                entry.unique_fields.push(field.clone());
            }
        }
        Ok(())
    }

    async fn find(&self, collection: &str, query: &FindQuery) -> Result<Vec<Document>, StoreError> {
        let guard = self.collections.read().map_err(|_| poisoned())?;
        let Some(coll) = guard.get(collection) else {
            return Ok(Vec::new());
        };
        let mut hits: Vec<(DocumentId, Document)> = coll
            .docs
            .iter()
            .filter(|(id, doc)| Collection::matches(&query.filter, id, doc))
            .cloned()
            .collect();
        drop(guard);

        if let Some(field) = &query.sort_by {
            // Missing values sort first, matching `NULLS FIRST` in the SQL store.
            hits.sort_by(|(_, a), (_, b)| {
                let a = a.get(field).and_then(text_of);
                let b = b.get(field).and_then(text_of);
                match (a, b) {
                    (Some(a), Some(b)) => a.cmp(&b),
                    (Some(_), None) => std::cmp::Ordering::Greater,
                    (None, Some(_)) => std::cmp::Ordering::Less,
                    (None, None) => std::cmp::Ordering::Equal,
                }
            });
        }

        Ok(hits
            .into_iter()
            .map(|(id, mut doc)| {
                for field in &query.exclude {
                    doc.remove(field);
                }
                with_id(id, doc)
            })
            .collect())
    }

    async fn insert_one(&self, collection: &str, doc: Document) -> Result<DocumentId, StoreError> {
        let mut guard = self.collections.write().map_err(|_| poisoned())?;
        let coll = guard.entry(collection.to_string()).or_default();
        if let Some(field) = coll.conflict(&doc, None) {
            return Err(StoreError::Duplicate {
                collection: collection.to_string(),
                value: doc.get(&field).cloned().unwrap_or_default(),
                field,
            });
        }
        let id = DocumentId::new();
        coll.docs.push((id, doc));
        Ok(id)
    }

    async fn update_one(
        &self,
        collection: &str,
        id: DocumentId,
        set: Document,
    ) -> Result<UpdateCounts, StoreError> {
        let mut guard = self.collections.write().map_err(|_| poisoned())?;
        let Some(coll) = guard.get_mut(collection) else {
            return Ok(UpdateCounts::default());
        };
        let Some(pos) = coll.docs.iter().position(|(doc_id, _)| *doc_id == id) else {
            return Ok(UpdateCounts::default());
        };
        let current = &coll.docs[pos].1;
        let mut merged = current.clone();
        merged.extend(set);
        if merged == *current {
            return Ok(UpdateCounts { matched: 1, modified: 0 });
        }
        if let Some(field) = coll.conflict(&merged, Some(id)) {
            return Err(StoreError::Duplicate {
                collection: collection.to_string(),
                value: merged.get(&field).cloned().unwrap_or_default(),
                field,
            });
        }
        coll.docs[pos].1 = merged;
        Ok(UpdateCounts { matched: 1, modified: 1 })
    }

    async fn delete_one(&self, collection: &str, id: DocumentId) -> Result<u64, StoreError> {
        let mut guard = self.collections.write().map_err(|_| poisoned())?;
        let Some(coll) = guard.get_mut(collection) else {
            return Ok(0);
        };
        let before = coll.docs.len();
        coll.docs.retain(|(doc_id, _)| *doc_id != id);
        Ok((before - coll.docs.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use testresult::TestResult;

    fn doc(v: Value) -> Document {
        match v {
            Value::Object(m) => m,
            _ => Document::new(),
        }
    }

    #[tokio::test]
    async fn unique_field_rejects_second_insert() -> TestResult {
        let store = MemoryStore::new();
        store.ensure_collection("produtos", &["nome".to_string()]).await?;
        store.insert_one("produtos", doc(json!({"nome": "X-Bacon", "preco": "20"}))).await?;

        let err = store
            .insert_one("produtos", doc(json!({"nome": "X-Bacon", "preco": "25"})))
            .await;
        assert!(matches!(err, Err(StoreError::Duplicate { field, .. }) if field == "nome"));
        Ok(())
    }

    #[tokio::test]
    async fn find_sorts_projects_and_filters() -> TestResult {
        let store = MemoryStore::new();
        store.insert_one("usuarios", doc(json!({"nome": "bruna", "senha": "123456"}))).await?;
        store.insert_one("usuarios", doc(json!({"nome": "Ana", "senha": "abcdef"}))).await?;
        store.insert_one("usuarios", doc(json!({"senha": "zzzzzz"}))).await?;

        let query = FindQuery::new(Filter::All)
            .excluding(&["senha".to_string()])
            .sorted_by("nome");
        let docs = store.find("usuarios", &query).await?;
        let names: Vec<Option<&str>> = docs.iter().map(|d| d.get("nome").and_then(Value::as_str)).collect();
        assert_eq!(names, vec![None, Some("Ana"), Some("bruna")]);
        assert!(docs.iter().all(|d| !d.contains_key("senha") && d.contains_key("_id")));

        let by_name = FindQuery::new(Filter::FieldEq { field: "nome".into(), value: "Ana".into() });
        assert_eq!(store.find("usuarios", &by_name).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn update_merges_and_reports_counts() -> TestResult {
        let store = MemoryStore::new();
        let id = store.insert_one("produtos", doc(json!({"nome": "Combo", "preco": "10"}))).await?;

        let counts = store.update_one("produtos", id, doc(json!({"preco": "12"}))).await?;
        assert_eq!(counts, UpdateCounts { matched: 1, modified: 1 });

        let same = store.update_one("produtos", id, doc(json!({"preco": "12"}))).await?;
        assert_eq!(same, UpdateCounts { matched: 1, modified: 0 });

        let missing = store.update_one("produtos", DocumentId::new(), doc(json!({"preco": "1"}))).await?;
        assert_eq!(missing, UpdateCounts::default());

        let found = store.find("produtos", &FindQuery::new(Filter::Id(id))).await?;
        assert_eq!(found[0].get("nome"), Some(&json!("Combo")));
        assert_eq!(found[0].get("preco"), Some(&json!("12")));
        Ok(())
    }

    #[tokio::test]
    async fn delete_counts_removed_documents() -> TestResult {
        let store = MemoryStore::new();
        let id = store.insert_one("produtos", doc(json!({"nome": "Suco"}))).await?;
        assert_eq!(store.delete_one("produtos", id).await?, 1);
        assert_eq!(store.delete_one("produtos", id).await?, 0);
        Ok(())
    }
}
