//! Typed accessors for the recipe collection.

use std::sync::Arc;

use serde_json::Value;

use crate::context::UserContext;
use crate::errors::Result;
use crate::recipes::{NewRecipe, Recipe};
use crate::store::{EntityKind, RemoteStore, Scope};

/// Owner id of the shared (discovered) recipe library.
pub const SHARED_LIBRARY_OWNER: &str = "library";

pub struct RecipeRepository {
    store: Arc<dyn RemoteStore>,
}

impl RecipeRepository {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    fn decode_all(docs: Vec<Value>) -> Result<Vec<Recipe>> {
        docs.into_iter()
            .map(|doc| Ok(serde_json::from_value(doc)?))
            .collect()
    }

    /// The user's own (custom) recipes.
    pub async fn list(&self, ctx: &UserContext) -> Result<Vec<Recipe>> {
        let docs = self
            .store
            .list(EntityKind::Recipe, &Scope::owned(ctx.user_id()))
            .await?;
        Self::decode_all(docs)
    }

    /// The shared discovery library.
    pub async fn list_library(&self) -> Result<Vec<Recipe>> {
        let docs = self
            .store
            .list(EntityKind::Recipe, &Scope::owned(SHARED_LIBRARY_OWNER))
            .await?;
        Self::decode_all(docs)
    }

    pub async fn get(&self, ctx: &UserContext, id: &str) -> Result<Recipe> {
        let doc = self.store.get(EntityKind::Recipe, ctx.user_id(), id).await?;
        Ok(serde_json::from_value(doc)?)
    }

    pub async fn create(&self, ctx: &UserContext, new_recipe: NewRecipe) -> Result<Recipe> {
        let mut doc = serde_json::to_value(&new_recipe)?;
        if let Some(object) = doc.as_object_mut() {
            object.insert("ownerId".to_string(), Value::String(ctx.user_id().to_string()));
        }
        let id = self
            .store
            .create(EntityKind::Recipe, ctx.user_id(), doc)
            .await?;
        self.get(ctx, &id).await
    }

    pub async fn update(&self, ctx: &UserContext, id: &str, patch: Value) -> Result<()> {
        self.store
            .update(EntityKind::Recipe, ctx.user_id(), id, patch)
            .await
    }

    pub async fn delete(&self, ctx: &UserContext, id: &str) -> Result<()> {
        self.store
            .delete(EntityKind::Recipe, ctx.user_id(), id)
            .await
    }
}
