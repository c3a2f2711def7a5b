//! Common routes: the `/api` banner.

use crate::handlers::{banner, not_found};
use axum::{routing::get, Router};

/// GET /api -> `{message, version}`.
pub fn common_routes() -> Router {
    Router::new().route("/api", get(banner).fallback(not_found))
}
