//! Recipe service: CRUD passthrough plus gateway-backed generation.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use crate::context::UserContext;
use crate::errors::Result;
use crate::generation::{validate_recipe, GenerationGateway, GenerationRequest};
use crate::recipes::{NewRecipe, Recipe, RecipeRepository, RecipeSource};

#[async_trait]
pub trait RecipeServiceTrait: Send + Sync {
    async fn list(&self, ctx: &UserContext) -> Result<Vec<Recipe>>;

    async fn create(&self, ctx: &UserContext, new_recipe: NewRecipe) -> Result<Recipe>;

    async fn delete(&self, ctx: &UserContext, id: &str) -> Result<()>;

    /// Generate a recipe through the external gateway, validate the payload,
    /// and persist it as `ai_generated`. A malformed payload fails before
    /// anything is written.
    async fn generate_recipe(&self, ctx: &UserContext, prompt: &str) -> Result<Recipe>;
}

pub struct RecipeService {
    repository: Arc<RecipeRepository>,
    gateway: Arc<dyn GenerationGateway>,
}

impl RecipeService {
    pub fn new(repository: Arc<RecipeRepository>, gateway: Arc<dyn GenerationGateway>) -> Self {
        Self {
            repository,
            gateway,
        }
    }
}

#[async_trait]
impl RecipeServiceTrait for RecipeService {
    async fn list(&self, ctx: &UserContext) -> Result<Vec<Recipe>> {
        self.repository.list(ctx).await
    }

    async fn create(&self, ctx: &UserContext, new_recipe: NewRecipe) -> Result<Recipe> {
        self.repository.create(ctx, new_recipe).await
    }

    async fn delete(&self, ctx: &UserContext, id: &str) -> Result<()> {
        self.repository.delete(ctx, id).await
    }

    async fn generate_recipe(&self, ctx: &UserContext, prompt: &str) -> Result<Recipe> {
        let request = GenerationRequest::for_recipe(prompt);
        let payload = self.gateway.generate(&request).await?;
        let generated = validate_recipe(&payload)?;
        debug!("generated recipe '{}' validated, persisting", generated.name);

        self.repository
            .create(
                ctx,
                NewRecipe {
                    name: generated.name,
                    description: generated.description,
                    cuisine: generated.cuisine,
                    difficulty: generated.difficulty,
                    prep_time_minutes: generated.prep_time_minutes,
                    cook_time_minutes: generated.cook_time_minutes,
                    servings: generated.servings,
                    ingredients: generated.ingredients,
                    instructions: generated.instructions,
                    nutrition: generated.nutrition,
                    source: RecipeSource::AiGenerated,
                    is_public: false,
                },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use crate::store::{EntityKind, MemoryStore, RemoteStore, Scope};
    use serde_json::{json, Value};

    struct ScriptedGateway {
        payload: Value,
    }

    #[async_trait]
    impl GenerationGateway for ScriptedGateway {
        async fn generate(&self, _request: &GenerationRequest) -> Result<Value> {
            Ok(self.payload.clone())
        }
    }

    fn service_over(store: &Arc<MemoryStore>, payload: Value) -> RecipeService {
        RecipeService::new(
            Arc::new(RecipeRepository::new(
                Arc::clone(store) as Arc<dyn RemoteStore>
            )),
            Arc::new(ScriptedGateway { payload }),
        )
    }

    fn recipe_payload() -> Value {
        json!({
            "name": "Paneer Tikka",
            "description": "Grilled paneer",
            "cuisine": "indian",
            "difficulty": "medium",
            "prepTimeMinutes": 20,
            "cookTimeMinutes": 15,
            "servings": 2,
            "ingredients": [{ "name": "Paneer", "amount": 250.0, "unit": "g" }],
            "instructions": "Marinate and grill.",
            "nutrition": { "calories": 420, "proteinG": 28, "carbsG": 12, "fatG": 30 },
        })
    }

    #[tokio::test]
    async fn generated_recipe_is_persisted_as_ai_generated() {
        let store = Arc::new(MemoryStore::new());
        let service = service_over(&store, recipe_payload());
        let ctx = UserContext::resolve(Some("u1")).unwrap();

        let recipe = service.generate_recipe(&ctx, "something grilled").await.unwrap();
        assert_eq!(recipe.source, RecipeSource::AiGenerated);
        assert_eq!(recipe.owner_id, "u1");

        let stored = store
            .list(EntityKind::Recipe, &Scope::owned("u1"))
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn payload_missing_nutrition_persists_nothing() {
        let mut payload = recipe_payload();
        payload.as_object_mut().unwrap().remove("nutrition");
        let store = Arc::new(MemoryStore::new());
        let service = service_over(&store, payload);
        let ctx = UserContext::resolve(Some("u1")).unwrap();

        let err = service.generate_recipe(&ctx, "anything").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let stored = store
            .list(EntityKind::Recipe, &Scope::owned("u1"))
            .await
            .unwrap();
        assert!(stored.is_empty());
    }
}
