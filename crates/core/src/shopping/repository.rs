//! Typed accessors for the shopping-list collection.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};

use crate::context::UserContext;
use crate::errors::Result;
use crate::shopping::{ShoppingItem, ShoppingList};
use crate::store::{EntityKind, RemoteStore, Scope};

pub struct ShoppingRepository {
    store: Arc<dyn RemoteStore>,
}

impl ShoppingRepository {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, ctx: &UserContext) -> Result<Vec<ShoppingList>> {
        let docs = self
            .store
            .list(EntityKind::ShoppingList, &Scope::owned(ctx.user_id()))
            .await?;
        docs.into_iter()
            .map(|doc| Ok(serde_json::from_value(doc)?))
            .collect()
    }

    pub async fn get(&self, ctx: &UserContext, id: &str) -> Result<ShoppingList> {
        let doc = self
            .store
            .get(EntityKind::ShoppingList, ctx.user_id(), id)
            .await?;
        Ok(serde_json::from_value(doc)?)
    }

    pub async fn create(
        &self,
        ctx: &UserContext,
        plan_id: Option<&str>,
        items: Vec<ShoppingItem>,
    ) -> Result<ShoppingList> {
        let mut doc = json!({
            "items": items,
            "active": true,
            "createdAt": Utc::now(),
        });
        if let (Some(object), Some(plan_id)) = (doc.as_object_mut(), plan_id) {
            object.insert("planId".to_string(), Value::String(plan_id.to_string()));
        }
        let id = self
            .store
            .create(EntityKind::ShoppingList, ctx.user_id(), doc)
            .await?;
        self.get(ctx, &id).await
    }

    /// Replace the list's item array.
    pub async fn set_items(&self, ctx: &UserContext, id: &str, items: &[ShoppingItem]) -> Result<()> {
        self.store
            .update(
                EntityKind::ShoppingList,
                ctx.user_id(),
                id,
                json!({ "items": items }),
            )
            .await
    }

    pub async fn delete(&self, ctx: &UserContext, id: &str) -> Result<()> {
        self.store
            .delete(EntityKind::ShoppingList, ctx.user_id(), id)
            .await
    }
}
