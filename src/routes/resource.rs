//! Resource CRUD routes. Mounted under `/api/<collection>`.
//! Methods a path does not serve fall through to the JSON 404, like unknown paths.

use crate::handlers::not_found;
use crate::handlers::resource::{create, delete, find_by_field, list, read, update};
use crate::service::CrudService;
use axum::{
    routing::{delete as delete_route, get},
    Router,
};

pub fn resource_routes(service: CrudService) -> Router {
    let by_field = format!("/{}/:value", service.resource().lookup_field);
    Router::new()
        .route("/", get(list).post(create).put(update).fallback(not_found))
        .route("/id/:id", get(read).fallback(not_found))
        .route(&by_field, get(find_by_field).fallback(not_found))
        .route("/:id", delete_route(delete).fallback(not_found))
        .with_state(service)
}
