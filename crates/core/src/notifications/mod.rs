//! In-app notifications: models, typed repository, service.

mod model;
mod repository;
mod service;

pub use model::*;
pub use repository::*;
pub use service::*;
