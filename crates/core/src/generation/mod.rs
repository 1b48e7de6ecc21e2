//! Generation gateway boundary.
//!
//! The generator is an opaque external capability. The core's job here is
//! (a) building the context payload, (b) validating the returned structure
//! before it may flow into derivation or persistence, and (c) failing closed:
//! a malformed payload is a validation error, never a partially-constructed
//! entity.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{Error, Result};
use crate::plans::MealType;
use crate::recipes::{Difficulty, Ingredient, NutritionFacts, Recipe};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationKind {
    Recipe,
    MealPlan,
}

/// Single request/response, no streaming.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub kind: GenerationKind,
    pub prompt: String,
    pub context: Value,
}

impl GenerationRequest {
    pub fn for_recipe(prompt: impl Into<String>) -> Self {
        Self {
            kind: GenerationKind::Recipe,
            prompt: prompt.into(),
            context: Value::Null,
        }
    }

    /// Meal-plan context carries the user's custom recipes, serialized down
    /// to the minimal fields the generator needs.
    pub fn for_meal_plan(prompt: impl Into<String>, custom_recipes: &[Recipe]) -> Self {
        let recipes: Vec<Value> = custom_recipes
            .iter()
            .map(|recipe| {
                serde_json::json!({
                    "name": recipe.name,
                    "cuisine": recipe.cuisine,
                    "servings": recipe.servings,
                    "nutrition": recipe.nutrition,
                })
            })
            .collect();
        Self {
            kind: GenerationKind::MealPlan,
            prompt: prompt.into(),
            context: serde_json::json!({ "customRecipes": recipes }),
        }
    }
}

/// External generation capability. Implementations return the raw payload;
/// callers validate it with [`validate_recipe`] / [`validate_meal_plan`]
/// before anything is persisted.
#[async_trait]
pub trait GenerationGateway: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<Value>;
}

/// Fully-required recipe payload schema. Every field must be present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedRecipe {
    pub name: String,
    pub description: String,
    pub cuisine: String,
    pub difficulty: Difficulty,
    pub prep_time_minutes: i32,
    pub cook_time_minutes: i32,
    pub servings: i32,
    pub ingredients: Vec<Ingredient>,
    pub instructions: String,
    pub nutrition: NutritionFacts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedMeal {
    pub name: String,
    pub meal_type: MealType,
    pub calories: i32,
    pub protein_g: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedDay {
    pub name: String,
    pub meals: Vec<GeneratedMeal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedMealPlan {
    pub name: String,
    pub days: Vec<GeneratedDay>,
}

/// Validate a recipe payload against the expected schema.
pub fn validate_recipe(payload: &Value) -> Result<GeneratedRecipe> {
    let recipe: GeneratedRecipe = serde_json::from_value(payload.clone())?;
    if recipe.name.trim().is_empty() {
        return Err(Error::validation("generated recipe has an empty name"));
    }
    if recipe.servings < 1 {
        return Err(Error::validation("generated recipe must serve at least one"));
    }
    if recipe.ingredients.is_empty() {
        return Err(Error::validation("generated recipe has no ingredients"));
    }
    if recipe.nutrition.calories < 0 || recipe.nutrition.protein_g < 0 {
        return Err(Error::validation("generated recipe has negative nutrition"));
    }
    Ok(recipe)
}

/// Validate a meal-plan payload against the expected schema.
pub fn validate_meal_plan(payload: &Value) -> Result<GeneratedMealPlan> {
    let plan: GeneratedMealPlan = serde_json::from_value(payload.clone())?;
    if plan.days.is_empty() {
        return Err(Error::validation("generated plan has no days"));
    }
    for day in &plan.days {
        if day.meals.is_empty() {
            return Err(Error::validation(format!(
                "generated plan day '{}' has no meals",
                day.name
            )));
        }
        for meal in &day.meals {
            if meal.calories < 0 || meal.protein_g < 0 {
                return Err(Error::validation(format!(
                    "generated meal '{}' has negative nutrition",
                    meal.name
                )));
            }
        }
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

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

    #[test]
    fn well_formed_recipe_payload_validates() {
        let recipe = validate_recipe(&recipe_payload()).unwrap();
        assert_eq!(recipe.nutrition.calories, 420);
    }

    #[test]
    fn missing_nutrition_fails_closed() {
        let mut payload = recipe_payload();
        payload.as_object_mut().unwrap().remove("nutrition");
        let err = validate_recipe(&payload).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn empty_ingredient_list_is_rejected() {
        let mut payload = recipe_payload();
        payload["ingredients"] = json!([]);
        assert!(validate_recipe(&payload).unwrap_err().is_validation());
    }

    #[test]
    fn plan_payload_requires_meals_in_every_day() {
        let payload = json!({
            "name": "Week of lunches",
            "days": [{ "name": "Day 1", "meals": [] }],
        });
        assert!(validate_meal_plan(&payload).unwrap_err().is_validation());
    }

    #[test]
    fn meal_plan_context_carries_minimal_recipe_fields() {
        let recipe = Recipe {
            id: "r1".into(),
            name: "Dal".into(),
            description: "Lentils".into(),
            cuisine: "indian".into(),
            difficulty: Difficulty::Easy,
            prep_time_minutes: 10,
            cook_time_minutes: 30,
            servings: 4,
            ingredients: vec![],
            instructions: "Simmer.".into(),
            nutrition: NutritionFacts {
                calories: 500,
                protein_g: 25,
                carbs_g: 60,
                fat_g: 10,
            },
            source: crate::recipes::RecipeSource::Manual,
            is_public: false,
            owner_id: "u1".into(),
        };
        let request = GenerationRequest::for_meal_plan("7 day plan", &[recipe]);
        let entry = &request.context["customRecipes"][0];
        assert_eq!(entry["name"], json!("Dal"));
        assert!(entry.get("instructions").is_none());
    }
}
