pub mod env;
pub mod resources;

pub use env::*;
pub use resources::*;
