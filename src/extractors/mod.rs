//! Custom request extractors.

mod body;
pub use body::RequestBody;
