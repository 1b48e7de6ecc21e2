//! Meal-plan domain: models, plan generation, typed repository, service.

mod generator;
mod model;
mod repository;
mod service;

pub use generator::*;
pub use model::*;
pub use repository::*;
pub use service::*;
