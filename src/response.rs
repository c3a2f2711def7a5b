//! Response bodies shared by the resource routes.

use crate::service::ValidationIssue;
use crate::store::DocumentId;
use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorList {
    pub errors: Vec<ValidationIssue>,
}

/// Acknowledgment of a single insert.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOutcome {
    pub acknowledged: bool,
    pub inserted_id: DocumentId,
}

/// Acknowledgment of a single update. Updates never upsert, so `upserted_id` is always null.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<DocumentId>,
    pub upserted_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

pub fn error_list(errors: Vec<ValidationIssue>) -> ErrorList {
    ErrorList { errors }
}

/// Body for a failed store call: `{"error": {"code", "message"}}`.
pub fn raw_error(code: &str, message: String) -> serde_json::Value {
    serde_json::json!({
        "error": {
            "code": code,
            "message": message
        }
    })
}

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(data))
}

pub fn accepted<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::ACCEPTED, Json(data))
}

pub fn ok<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::OK, Json(data))
}
