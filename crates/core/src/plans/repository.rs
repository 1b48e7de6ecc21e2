//! Typed accessors for the meal-plan collection.

use std::sync::Arc;

use serde_json::Value;

use crate::context::UserContext;
use crate::errors::Result;
use crate::plans::MealPlan;
use crate::store::{EntityKind, RemoteStore, Scope};

pub struct PlanRepository {
    store: Arc<dyn RemoteStore>,
}

impl PlanRepository {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, ctx: &UserContext) -> Result<Vec<MealPlan>> {
        let docs = self
            .store
            .list(EntityKind::MealPlan, &Scope::owned(ctx.user_id()))
            .await?;
        docs.into_iter()
            .map(|doc| Ok(serde_json::from_value(doc)?))
            .collect()
    }

    pub async fn get(&self, ctx: &UserContext, id: &str) -> Result<MealPlan> {
        let doc = self
            .store
            .get(EntityKind::MealPlan, ctx.user_id(), id)
            .await?;
        Ok(serde_json::from_value(doc)?)
    }

    /// Persist a freshly derived plan. The store assigns the id.
    pub async fn create(&self, ctx: &UserContext, plan: &MealPlan) -> Result<MealPlan> {
        let mut doc = serde_json::to_value(plan)?;
        if let Some(object) = doc.as_object_mut() {
            object.remove("id");
        }
        let id = self
            .store
            .create(EntityKind::MealPlan, ctx.user_id(), doc)
            .await?;
        self.get(ctx, &id).await
    }

    pub async fn update(&self, ctx: &UserContext, id: &str, patch: Value) -> Result<()> {
        self.store
            .update(EntityKind::MealPlan, ctx.user_id(), id, patch)
            .await
    }

    /// Activate one plan; the store deactivates the rest in the same change.
    pub async fn set_active(&self, ctx: &UserContext, id: &str) -> Result<()> {
        self.store.set_active_plan(ctx.user_id(), id).await
    }

    pub async fn delete(&self, ctx: &UserContext, id: &str) -> Result<()> {
        self.store
            .delete(EntityKind::MealPlan, ctx.user_id(), id)
            .await
    }
}
