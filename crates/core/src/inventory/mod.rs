//! Inventory domain: models and typed repository.

mod model;
mod repository;

pub use model::*;
pub use repository::*;
