//! HTTP handlers for resource CRUD, the banner and the 404 fallback.

pub mod common;
pub mod resource;
pub use common::{banner, not_found};
