//! HTTP server wiring: routers, middleware, static files, 404 fallback.

use crate::config::Resource;
use crate::handlers::not_found;
use crate::routes::{common_routes, resource_routes};
use crate::state::AppState;
use axum::{handler::HandlerWithoutStateExt, Router};
use std::path::Path;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, services::ServeDir, trace::TraceLayer};

/// Largest accepted request body.
pub const BODY_LIMIT: usize = 100 * 1024;

/// Full application router. Unmatched requests try the public directory, then get the JSON 404.
pub fn build_router(state: AppState, public_dir: &Path) -> Router {
    let mut app = common_routes();
    for resource in Resource::all() {
        let prefix = format!("/api/{}", resource.collection);
        app = app.nest(&prefix, resource_routes(state.service(resource)));
    }

    let static_files = ServeDir::new(public_dir)
        .call_fallback_on_method_not_allowed(true)
        .not_found_service(not_found.into_service());

    app.fallback_service(static_files)
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
