//! Resource CRUD handlers: list, read, find by field, create, update, delete.

use crate::error::ApiError;
use crate::extractors::RequestBody;
use crate::response::{accepted, created, ok};
use crate::service::CrudService;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};

pub async fn list(State(service): State<CrudService>) -> Result<impl IntoResponse, ApiError> {
    let docs = service.list().await?;
    Ok(ok(docs))
}

pub async fn read(
    State(service): State<CrudService>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let docs = service.read(&id).await?;
    Ok(ok(docs))
}

pub async fn find_by_field(
    State(service): State<CrudService>,
    Path(value): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let docs = service.find_by_field(&value).await?;
    Ok(ok(docs))
}

pub async fn create(
    State(service): State<CrudService>,
    RequestBody(body): RequestBody,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = service.create(body).await?;
    Ok(created(outcome))
}

pub async fn update(
    State(service): State<CrudService>,
    RequestBody(body): RequestBody,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = service.update(body).await?;
    Ok(accepted(outcome))
}

pub async fn delete(
    State(service): State<CrudService>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = service.delete(&id).await?;
    Ok(accepted(outcome))
}
