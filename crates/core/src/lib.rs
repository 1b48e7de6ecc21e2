//! Mealfolio core: the client-side reactive state layer of the meal-planning
//! app.
//!
//! The authoritative store lives behind [`store::RemoteStore`]. This crate
//! keeps per-scope cached views in sync with it ([`sync::SubscriptionManager`]),
//! applies user mutations optimistically ([`sync::MutationCoordinator`]),
//! derives plans and shopping lists locally ([`plans`], [`shopping`]) and
//! validates externally generated content before it touches any state
//! ([`generation`]).

pub mod context;
pub mod errors;
pub mod generation;
pub mod inventory;
pub mod notifications;
pub mod plans;
pub mod profiles;
pub mod recipes;
pub mod shopping;
pub mod store;
pub mod sync;

pub use context::UserContext;
pub use errors::{Error, Result};
