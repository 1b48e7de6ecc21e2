//! Typed accessors for the inventory collection.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};

use crate::context::UserContext;
use crate::errors::Result;
use crate::inventory::{InventoryItem, NewInventoryItem};
use crate::store::{EntityKind, RemoteStore, Scope};

pub struct InventoryRepository {
    store: Arc<dyn RemoteStore>,
}

impl InventoryRepository {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, ctx: &UserContext) -> Result<Vec<InventoryItem>> {
        let docs = self
            .store
            .list(EntityKind::InventoryItem, &Scope::owned(ctx.user_id()))
            .await?;
        docs.into_iter()
            .map(|doc| Ok(serde_json::from_value(doc)?))
            .collect()
    }

    pub async fn get(&self, ctx: &UserContext, id: &str) -> Result<InventoryItem> {
        let doc = self
            .store
            .get(EntityKind::InventoryItem, ctx.user_id(), id)
            .await?;
        Ok(serde_json::from_value(doc)?)
    }

    pub async fn create(&self, ctx: &UserContext, new_item: NewInventoryItem) -> Result<InventoryItem> {
        let now = Utc::now();
        let mut doc = serde_json::to_value(&new_item)?;
        if let Some(object) = doc.as_object_mut() {
            object.insert("addedAt".to_string(), serde_json::to_value(now)?);
            object.insert("updatedAt".to_string(), serde_json::to_value(now)?);
        }
        let id = self
            .store
            .create(EntityKind::InventoryItem, ctx.user_id(), doc)
            .await?;
        self.get(ctx, &id).await
    }

    /// Partial update; bumps the updated timestamp alongside the patch.
    pub async fn update(&self, ctx: &UserContext, id: &str, mut patch: Value) -> Result<()> {
        if let Some(object) = patch.as_object_mut() {
            object.insert("updatedAt".to_string(), serde_json::to_value(Utc::now())?);
        }
        self.store
            .update(EntityKind::InventoryItem, ctx.user_id(), id, patch)
            .await
    }

    /// Replace-by-increment used by fold-back.
    pub async fn set_quantity(&self, ctx: &UserContext, id: &str, quantity: f64) -> Result<()> {
        self.update(ctx, id, json!({ "quantity": quantity })).await
    }

    pub async fn delete(&self, ctx: &UserContext, id: &str) -> Result<()> {
        self.store
            .delete(EntityKind::InventoryItem, ctx.user_id(), id)
            .await
    }
}
