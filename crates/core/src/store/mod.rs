//! Remote store boundary.
//!
//! The authoritative store is an external service; the core only sees it
//! through [`RemoteStore`]. Documents cross this boundary as
//! `serde_json::Value` and are decoded into typed models by the entity
//! repositories, mirroring how sync payloads stay JSON until the edge.

mod memory;

pub use memory::MemoryStore;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::Result;

/// Collections that participate in the sync core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    InventoryItem,
    Recipe,
    MealPlan,
    ShoppingList,
    Notification,
    NotificationPreferences,
    UserProfile,
}

impl EntityKind {
    /// Wire name for the collection, as used in API paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InventoryItem => "inventory_item",
            Self::Recipe => "recipe",
            Self::MealPlan => "meal_plan",
            Self::ShoppingList => "shopping_list",
            Self::Notification => "notification",
            Self::NotificationPreferences => "notification_preferences",
            Self::UserProfile => "user_profile",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional server-side narrowing of a collection subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeFilter {
    All,
    UnreadOnly,
    ActiveOnly,
}

impl ScopeFilter {
    /// Whether a document belongs to the filtered view.
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Self::All => true,
            Self::UnreadOnly => doc.get("read").and_then(Value::as_bool) == Some(false),
            Self::ActiveOnly => doc.get("active").and_then(Value::as_bool) == Some(true),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::UnreadOnly => "unread_only",
            Self::ActiveOnly => "active_only",
        }
    }
}

/// Identifies which subset of a collection a subscription targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scope {
    pub owner_id: String,
    pub filter: ScopeFilter,
}

impl Scope {
    /// Everything the owner has in the collection.
    pub fn owned(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            filter: ScopeFilter::All,
        }
    }

    pub fn filtered(owner_id: impl Into<String>, filter: ScopeFilter) -> Self {
        Self {
            owner_id: owner_id.into(),
            filter,
        }
    }
}

/// Event emitted by a remote collection watch.
///
/// Snapshots replace the whole scoped view; consumers never merge deltas.
/// `Failed` is terminal for the watch that emitted it.
#[derive(Debug, Clone)]
pub enum CollectionEvent {
    Snapshot(Vec<Value>),
    Failed(String),
}

/// Callback receiving watch events.
pub type ChangeSink = Arc<dyn Fn(CollectionEvent) + Send + Sync>;

/// Handle for a live remote watch; cancels on drop.
///
/// Cancellation is the only primitive: an in-flight write is never cancelled,
/// only the delivery of further snapshots stops.
pub struct RemoteWatch {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl RemoteWatch {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Explicitly stop the watch.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for RemoteWatch {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for RemoteWatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteWatch")
            .field("cancelled", &self.cancel.is_none())
            .finish()
    }
}

/// Typed boundary to the authoritative remote store.
///
/// `update` carries a partial field set (shallow merge on the store side).
/// `set_active_plan` is the one compound operation: the previous active plan
/// is deactivated and the new one activated together, so at most one plan per
/// owner is ever active.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Start a scoped collection watch. The store emits an initial full
    /// snapshot, then one snapshot per change, in store order.
    async fn watch(&self, kind: EntityKind, scope: Scope, sink: ChangeSink) -> Result<RemoteWatch>;

    /// One-shot read of the scoped collection (same view a watch would
    /// deliver as its next snapshot).
    async fn list(&self, kind: EntityKind, scope: &Scope) -> Result<Vec<Value>>;

    async fn get(&self, kind: EntityKind, owner_id: &str, id: &str) -> Result<Value>;

    /// Create a document; the store assigns and returns the id.
    async fn create(&self, kind: EntityKind, owner_id: &str, doc: Value) -> Result<String>;

    async fn update(&self, kind: EntityKind, owner_id: &str, id: &str, patch: Value) -> Result<()>;

    async fn delete(&self, kind: EntityKind, owner_id: &str, id: &str) -> Result<()>;

    /// Replace the per-owner singleton document (preferences, profile).
    async fn upsert_singleton(&self, kind: EntityKind, owner_id: &str, doc: Value) -> Result<()>;

    async fn set_active_plan(&self, owner_id: &str, plan_id: &str) -> Result<()>;
}

/// Extract the `id` field of a stored document.
pub fn doc_id(doc: &Value) -> Option<&str> {
    doc.get("id").and_then(Value::as_str)
}
