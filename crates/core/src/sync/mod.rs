//! Reactive synchronization core: shared subscriptions over the remote store
//! and optimistic local mutations reconciled against it.

mod optimistic;
mod subscriptions;
mod view;

pub use optimistic::*;
pub use subscriptions::*;
pub use view::*;
