//! Hamburgueria API: CRUD REST backend for `usuarios` and `produtos` over a document store.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod server;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{AppConfig, Resource};
pub use error::{ApiError, ConfigError, StoreError};
pub use server::build_router;
pub use service::{CrudService, RequestValidator, ValidationIssue};
pub use state::AppState;
pub use store::{ensure_database_exists, DocumentId, DocumentStore, MemoryStore, PgDocumentStore};
