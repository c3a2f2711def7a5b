//! Shared application state: the persistence handle, built once at startup.

use crate::config::Resource;
use crate::error::StoreError;
use crate::service::CrudService;
use crate::store::DocumentStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        AppState { store }
    }

    pub fn service(&self, resource: Resource) -> CrudService {
        CrudService::new(self.store.clone(), resource)
    }

    /// Create every mounted collection and its unique constraints.
    pub async fn ensure_collections(&self) -> Result<(), StoreError> {
        for resource in Resource::all() {
            self.store
                .ensure_collection(&resource.collection, &resource.unique_fields())
                .await?;
            tracing::info!(collection = %resource.collection, "collection ready");
        }
        Ok(())
    }
}
