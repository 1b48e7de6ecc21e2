//! Shopping lists: models, aggregation against inventory, typed repository,
//! service with fold-back.

mod aggregator;
mod model;
mod repository;
mod service;

pub use aggregator::*;
pub use model::*;
pub use repository::*;
pub use service::*;
