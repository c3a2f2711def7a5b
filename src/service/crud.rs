//! CrudService: the six resource operations, one store call each.

use crate::config::Resource;
use crate::error::{ApiError, StoreError};
use crate::response::{DeleteOutcome, InsertOutcome, UpdateOutcome};
use crate::service::validation::{RequestValidator, ValidationIssue};
use crate::store::{text_of, Document, DocumentId, DocumentStore, Filter, FindQuery, ID_FIELD};
use axum::http::StatusCode;
use serde_json::Value;
use std::sync::Arc;

/// CRUD over one resource. Cheap to clone; shared by every handler of that resource.
#[derive(Clone)]
pub struct CrudService {
    store: Arc<dyn DocumentStore>,
    resource: Arc<Resource>,
}

impl CrudService {
    pub fn new(store: Arc<dyn DocumentStore>, resource: Resource) -> Self {
        CrudService {
            store,
            resource: Arc::new(resource),
        }
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    fn query(&self, filter: Filter) -> FindQuery {
        FindQuery::new(filter).excluding(&self.resource.hidden_fields)
    }

    /// All records sorted by the sort field, hidden fields removed.
    pub async fn list(&self) -> Result<Vec<Document>, ApiError> {
        let query = self.query(Filter::All).sorted_by(&self.resource.sort_field);
        self.store
            .find(&self.resource.collection, &query)
            .await
            .map_err(|source| ApiError::Listing {
                label: self.resource.collection.clone(),
                source,
            })
    }

    /// Zero or one record.
    pub async fn read(&self, id: &str) -> Result<Vec<Document>, ApiError> {
        let id = DocumentId::parse(id)?;
        Ok(self.store.find(&self.resource.collection, &self.query(Filter::Id(id))).await?)
    }

    pub async fn find_by_field(&self, value: &str) -> Result<Vec<Document>, ApiError> {
        let filter = Filter::FieldEq {
            field: self.resource.lookup_field.clone(),
            value: value.to_string(),
        };
        Ok(self.store.find(&self.resource.collection, &self.query(filter)).await?)
    }

    /// Validate, check uniqueness, insert. The identifier is always store-assigned.
    pub async fn create(&self, mut body: Document) -> Result<InsertOutcome, ApiError> {
        if body.remove(ID_FIELD).is_some() {
            tracing::debug!(collection = %self.resource.collection, "ignoring client-supplied _id on create");
        }
        self.validate(&mut body, None, StatusCode::BAD_REQUEST).await?;
        let id = self
            .store
            .insert_one(&self.resource.collection, body)
            .await
            .map_err(|e| self.write_error(e, StatusCode::BAD_REQUEST))?;
        tracing::info!(collection = %self.resource.collection, id = %id, "created");
        Ok(InsertOutcome {
            acknowledged: true,
            inserted_id: id,
        })
    }

    /// Body carries `_id`; it is stripped and the remaining fields are merged into that record.
    /// Succeeds even when no record matched; the counts tell the caller.
    pub async fn update(&self, mut body: Document) -> Result<UpdateOutcome, ApiError> {
        let forbidden = StatusCode::FORBIDDEN;
        let id = match body.remove(ID_FIELD) {
            None | Some(Value::Null) => Err(ValidationIssue::new(
                ID_FIELD,
                Value::Null,
                "É obrigatório informar o _id do registro",
            )),
            Some(raw) => text_of(&raw)
                .and_then(|s| DocumentId::parse(&s).ok())
                .ok_or_else(|| ValidationIssue::new(ID_FIELD, raw, "O _id informado é inválido")),
        };
        let id = match id {
            Ok(id) => id,
            Err(issue) => {
                let mut issues = vec![issue];
                issues.extend(RequestValidator::validate(&mut body, &self.resource.rules));
                return Err(ApiError::Validation {
                    status: forbidden,
                    issues,
                });
            }
        };

        self.validate(&mut body, Some(id), forbidden).await?;
        let counts = self
            .store
            .update_one(&self.resource.collection, id, body)
            .await
            .map_err(|e| self.write_error(e, forbidden))?;
        if counts.matched == 0 {
            tracing::warn!(collection = %self.resource.collection, id = %id, "update matched no record");
        }
        Ok(UpdateOutcome {
            acknowledged: true,
            matched_count: counts.matched,
            modified_count: counts.modified,
            upserted_id: None,
            upserted_count: 0,
        })
    }

    /// Succeeds even when no record matched (`deletedCount` 0).
    pub async fn delete(&self, id: &str) -> Result<DeleteOutcome, ApiError> {
        let id = DocumentId::parse(id)?;
        let deleted = self.store.delete_one(&self.resource.collection, id).await?;
        if deleted == 0 {
            tracing::warn!(collection = %self.resource.collection, id = %id, "delete matched no record");
        }
        Ok(DeleteOutcome {
            acknowledged: true,
            deleted_count: deleted,
        })
    }

    async fn validate(
        &self,
        body: &mut Document,
        current: Option<DocumentId>,
        status: StatusCode,
    ) -> Result<(), ApiError> {
        let issues = RequestValidator::check_all(self.store.as_ref(), &self.resource, body, current).await?;
        if !issues.is_empty() {
            return Err(ApiError::Validation { status, issues });
        }
        Ok(())
    }

    /// A unique-constraint hit at write time reads as the same issue the lookup would have produced.
    fn write_error(&self, e: StoreError, status: StatusCode) -> ApiError {
        match e {
            StoreError::Duplicate { field, value, .. } => ApiError::Validation {
                status,
                issues: vec![RequestValidator::duplicate_issue(&self.resource, &field, value)],
            },
            other => other.into(),
        }
    }
}
