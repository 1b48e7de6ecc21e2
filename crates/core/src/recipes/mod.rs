//! Recipe domain: models, typed repository, and generation-backed service.

mod model;
mod repository;
mod service;

pub use model::*;
pub use repository::*;
pub use service::*;
