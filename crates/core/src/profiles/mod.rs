//! User profile and notification preferences: per-user singleton records.

mod model;
mod repository;
mod service;

pub use model::*;
pub use repository::*;
pub use service::*;
