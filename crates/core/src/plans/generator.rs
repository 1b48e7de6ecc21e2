//! Plan derivation: pure functions computing a meal plan from its inputs.
//!
//! Selection is randomized; two calls over the same pool may differ. What is
//! guaranteed: every meal's nutrition matches its source recipe, and every
//! day's totals are exactly the sum of its meals.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::errors::{Error, Result};
use crate::generation::GeneratedMealPlan;
use crate::plans::{Day, Meal, MealPlan, MealType, PlanDuration};
use crate::recipes::Recipe;

/// Slot types by position; plans cap at four meals a day.
const MEAL_SLOTS: [MealType; 4] = [
    MealType::Breakfast,
    MealType::Lunch,
    MealType::Dinner,
    MealType::Snack,
];

#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    pub name: String,
    pub duration: PlanDuration,
    /// Empty means no cuisine filter.
    pub cuisines: Vec<String>,
    pub include_custom_recipes: bool,
}

fn cuisine_matches(recipe: &Recipe, cuisines: &[String]) -> bool {
    cuisines.is_empty()
        || cuisines
            .iter()
            .any(|cuisine| recipe.cuisine.eq_ignore_ascii_case(cuisine))
}

/// Union of discovered and custom recipes, filtered by cuisine, with custom
/// ones excluded when the flag is off.
pub fn build_recipe_pool(
    discovered: &[Recipe],
    custom: &[Recipe],
    cuisines: &[String],
    include_custom: bool,
) -> Vec<Recipe> {
    let mut pool: Vec<Recipe> = discovered
        .iter()
        .filter(|recipe| cuisine_matches(recipe, cuisines))
        .cloned()
        .collect();
    if include_custom {
        pool.extend(
            custom
                .iter()
                .filter(|recipe| cuisine_matches(recipe, cuisines))
                .cloned(),
        );
    }
    pool
}

/// Derive a plan from the pool: one day per day of duration, `meals_per_day`
/// meals each, nutrition copied from the selected recipe.
pub fn generate_plan<R: Rng>(
    request: &PlanRequest,
    pool: &[Recipe],
    meals_per_day: usize,
    starts_at: DateTime<Utc>,
    rng: &mut R,
) -> Result<MealPlan> {
    if pool.is_empty() {
        return Err(Error::validation("recipe pool is empty"));
    }
    if meals_per_day < 1 {
        return Err(Error::validation("meals per day must be at least one"));
    }
    let slots = meals_per_day.min(MEAL_SLOTS.len());

    let day_count = request.duration.days();
    let mut days = Vec::with_capacity(day_count);
    for day_index in 0..day_count {
        let mut meals = Vec::with_capacity(slots);
        for slot in 0..slots {
            let recipe = &pool[rng.gen_range(0..pool.len())];
            meals.push(Meal {
                name: recipe.name.clone(),
                meal_type: MEAL_SLOTS[slot],
                recipe_id: Some(recipe.id.clone()),
                calories: recipe.nutrition.calories,
                protein_g: recipe.nutrition.protein_g,
                completed: false,
            });
        }
        days.push(Day {
            name: format!("Day {}", day_index + 1),
            meals,
        });
    }

    Ok(MealPlan {
        id: String::new(),
        name: request.name.clone(),
        duration: request.duration,
        cuisines: request.cuisines.clone(),
        include_custom_recipes: request.include_custom_recipes,
        days,
        starts_at,
        ends_at: starts_at + Duration::days(day_count as i64),
        active: false,
    })
}

/// Normalize a validated gateway payload into a plan.
///
/// The generated day count must match the requested duration; totals are
/// recomputed from the meals, never trusted from the payload.
pub fn plan_from_generated(
    request: &PlanRequest,
    generated: &GeneratedMealPlan,
    starts_at: DateTime<Utc>,
) -> Result<MealPlan> {
    let day_count = request.duration.days();
    if generated.days.len() != day_count {
        return Err(Error::validation(format!(
            "generated plan has {} days, expected {}",
            generated.days.len(),
            day_count
        )));
    }

    let days = generated
        .days
        .iter()
        .map(|day| Day {
            name: day.name.clone(),
            meals: day
                .meals
                .iter()
                .map(|meal| Meal {
                    name: meal.name.clone(),
                    meal_type: meal.meal_type,
                    recipe_id: None,
                    calories: meal.calories,
                    protein_g: meal.protein_g,
                    completed: false,
                })
                .collect(),
        })
        .collect();

    Ok(MealPlan {
        id: String::new(),
        name: generated.name.clone(),
        duration: request.duration,
        cuisines: request.cuisines.clone(),
        include_custom_recipes: request.include_custom_recipes,
        days,
        starts_at,
        ends_at: starts_at + Duration::days(day_count as i64),
        active: false,
    })
}
