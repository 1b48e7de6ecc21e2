//! HTTP backend for the Mealfolio core: a [`mealfolio_core::store::RemoteStore`]
//! and [`mealfolio_core::generation::GenerationGateway`] over the cloud REST
//! API, with collection watches implemented as polling loops.

mod client;
mod error;
mod gateway;
mod store;
pub mod types;

pub use client::MealfolioApiClient;
pub use error::{ApiRetryClass, RemoteApiError};
pub use gateway::HttpGenerationGateway;
pub use store::HttpRemoteStore;
