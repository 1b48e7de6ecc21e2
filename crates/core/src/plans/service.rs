//! Meal-plan service: pool-based derivation, gateway-backed generation,
//! activation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::debug;

use crate::context::UserContext;
use crate::errors::Result;
use crate::generation::{validate_meal_plan, GenerationGateway, GenerationRequest};
use crate::plans::{
    build_recipe_pool, generate_plan, plan_from_generated, MealPlan, PlanRepository, PlanRequest,
};
use crate::profiles::ProfileRepository;
use crate::recipes::RecipeRepository;

#[async_trait]
pub trait PlanServiceTrait: Send + Sync {
    async fn list(&self, ctx: &UserContext) -> Result<Vec<MealPlan>>;

    /// Derive a plan locally from the recipe pool and persist it. The pool is
    /// the shared library plus, when requested, the user's own recipes; meals
    /// per day comes from the user's profile.
    async fn generate_from_pool(&self, ctx: &UserContext, request: PlanRequest)
        -> Result<MealPlan>;

    /// Generate a plan through the external gateway, validate the payload,
    /// and persist it. A malformed payload fails before anything is written.
    async fn generate_with_gateway(
        &self,
        ctx: &UserContext,
        request: PlanRequest,
        prompt: &str,
    ) -> Result<MealPlan>;

    /// Make one plan active; any previously active plan is deactivated in the
    /// same store change.
    async fn set_active(&self, ctx: &UserContext, id: &str) -> Result<()>;

    async fn delete(&self, ctx: &UserContext, id: &str) -> Result<()>;
}

pub struct PlanService {
    repository: Arc<PlanRepository>,
    recipes: Arc<RecipeRepository>,
    profiles: Arc<ProfileRepository>,
    gateway: Arc<dyn GenerationGateway>,
}

impl PlanService {
    pub fn new(
        repository: Arc<PlanRepository>,
        recipes: Arc<RecipeRepository>,
        profiles: Arc<ProfileRepository>,
        gateway: Arc<dyn GenerationGateway>,
    ) -> Self {
        Self {
            repository,
            recipes,
            profiles,
            gateway,
        }
    }
}

#[async_trait]
impl PlanServiceTrait for PlanService {
    async fn list(&self, ctx: &UserContext) -> Result<Vec<MealPlan>> {
        self.repository.list(ctx).await
    }

    async fn generate_from_pool(
        &self,
        ctx: &UserContext,
        request: PlanRequest,
    ) -> Result<MealPlan> {
        let profile = self.profiles.get_profile(ctx).await?;
        let library = self.recipes.list_library().await?;
        let custom = self.recipes.list(ctx).await?;
        let pool = build_recipe_pool(
            &library,
            &custom,
            &request.cuisines,
            request.include_custom_recipes,
        );
        debug!(
            "deriving plan '{}' from a pool of {} recipes",
            request.name,
            pool.len()
        );

        let plan = generate_plan(
            &request,
            &pool,
            profile.meals_per_day as usize,
            Utc::now(),
            &mut rand::thread_rng(),
        )?;
        self.repository.create(ctx, &plan).await
    }

    async fn generate_with_gateway(
        &self,
        ctx: &UserContext,
        request: PlanRequest,
        prompt: &str,
    ) -> Result<MealPlan> {
        let custom = self.recipes.list(ctx).await?;
        let gateway_request = GenerationRequest::for_meal_plan(prompt, &custom);
        let payload = self.gateway.generate(&gateway_request).await?;
        let generated = validate_meal_plan(&payload)?;
        debug!("generated plan '{}' validated, persisting", generated.name);

        let plan = plan_from_generated(&request, &generated, Utc::now())?;
        self.repository.create(ctx, &plan).await
    }

    async fn set_active(&self, ctx: &UserContext, id: &str) -> Result<()> {
        self.repository.set_active(ctx, id).await
    }

    async fn delete(&self, ctx: &UserContext, id: &str) -> Result<()> {
        self.repository.delete(ctx, id).await
    }
}
