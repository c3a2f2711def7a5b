//! Typed errors and HTTP mapping.

use crate::response::{error_list, raw_error};
use crate::service::ValidationIssue;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid {var}: {value}")]
    InvalidVar { var: &'static str, value: String },
    #[error("invalid schema name: {0}")]
    InvalidSchema(String),
    #[error("invalid DATABASE_URL: {0}")]
    InvalidDatabaseUrl(String),
}

/// Failures raised by a document store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid identifier: {0}")]
    InvalidId(String),
    #[error("duplicate key on {collection}.{field}")]
    Duplicate {
        collection: String,
        field: String,
        value: serde_json::Value,
    },
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("corrupt document: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::InvalidId(_) => "invalid_id",
            StoreError::Duplicate { .. } => "duplicate_key",
            StoreError::Db(_) => "database_error",
            StoreError::Unavailable(_) => "unavailable",
            StoreError::Corrupt(_) => "corrupt_document",
            StoreError::Config(_) => "config_error",
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    /// Field rules rejected the body. Create answers 400, update answers 403.
    #[error("validation failed ({} issues)", .issues.len())]
    Validation {
        status: StatusCode,
        issues: Vec<ValidationIssue>,
    },
    /// The single store call failed; its error goes back verbatim.
    #[error(transparent)]
    Store(StoreError),
    /// Listing failed. `label` names the collection in the message.
    #[error("listing {label}: {source}")]
    Listing { label: String, source: StoreError },
    #[error("bad body: {0}")]
    BadBody(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Corrupt(msg) => ApiError::Internal(msg),
            other => ApiError::Store(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation { status, issues } => (status, Json(error_list(issues))).into_response(),
            ApiError::Store(e) => {
                tracing::debug!(error = %e, "store call failed");
                (StatusCode::BAD_REQUEST, Json(raw_error(e.code(), e.to_string()))).into_response()
            }
            ApiError::Listing { label, source } => {
                tracing::error!(error = %source, "listing failed");
                let issue = ValidationIssue::new(
                    "/",
                    serde_json::Value::String(source.to_string()),
                    format!("Erro ao obter a listagem dos {}", label),
                )
                .at(None);
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error_list(vec![issue]))).into_response()
            }
            ApiError::BadBody(msg) => {
                let issue = ValidationIssue::new("body", serde_json::Value::Null, msg);
                (StatusCode::BAD_REQUEST, Json(error_list(vec![issue]))).into_response()
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "unexpected failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": msg })),
                )
                    .into_response()
            }
        }
    }
}
