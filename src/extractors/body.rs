//! Request body as a document, from JSON or form-urlencoded payloads.

use crate::error::ApiError;
use crate::store::Document;
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use serde_json::Value;

/// Body fields of a write request. A request without content type and without
/// a body yields an empty document, so the field rules report what is missing.
#[derive(Clone, Debug, Default)]
pub struct RequestBody(pub Document);

fn into_document(value: Value) -> Result<RequestBody, ApiError> {
    match value {
        Value::Object(m) => Ok(RequestBody(m)),
        _ => Err(ApiError::BadBody("body must be a JSON object".into())),
    }
}

#[async_trait]
impl<S> FromRequest<S> for RequestBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_ascii_lowercase());

        match content_type.as_deref() {
            Some(ct) if ct.starts_with("application/x-www-form-urlencoded") => {
                let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                    .await
                    .map_err(|e| ApiError::BadBody(e.body_text()))?;
                Ok(RequestBody(
                    pairs.into_iter().map(|(k, v)| (k, Value::String(v))).collect(),
                ))
            }
            Some(_) => {
                let Json(value) = Json::<Value>::from_request(req, state)
                    .await
                    .map_err(|e| ApiError::BadBody(e.body_text()))?;
                into_document(value)
            }
            None => {
                let bytes = Bytes::from_request(req, state)
                    .await
                    .map_err(|e| ApiError::BadBody(e.body_text()))?;
                if bytes.iter().all(u8::is_ascii_whitespace) {
                    return Ok(RequestBody::default());
                }
                let value: Value =
                    serde_json::from_slice(&bytes).map_err(|e| ApiError::BadBody(e.to_string()))?;
                into_document(value)
            }
        }
    }
}
