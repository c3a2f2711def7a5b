//! Service banner and the catch-all 404.

use crate::response::error_list;
use crate::service::ValidationIssue;
use axum::{extract::OriginalUri, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

pub const BANNER_MESSAGE: &str = "API Hamburgueria - 100% funcional!🍔";
pub const API_VERSION: &str = "1.0.0";

#[derive(Serialize)]
pub struct Banner {
    message: &'static str,
    version: &'static str,
}

pub async fn banner() -> Json<Banner> {
    Json(Banner {
        message: BANNER_MESSAGE,
        version: API_VERSION,
    })
}

/// Any path (or method) no route handles.
pub async fn not_found(OriginalUri(uri): OriginalUri) -> impl IntoResponse {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    tracing::debug!(uri = %path, "no route");
    let issue = ValidationIssue::new(
        "routes",
        serde_json::Value::String(path.clone()),
        format!("A rota {} não existe nesta API 🚫", path),
    )
    .at(None);
    (StatusCode::NOT_FOUND, Json(error_list(vec![issue])))
}
