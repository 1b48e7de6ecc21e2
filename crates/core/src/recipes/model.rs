//! Recipe domain models.

use serde::{Deserialize, Serialize};

/// Per-serving nutrition facts. Shared with inventory items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionFacts {
    pub calories: i32,
    pub protein_g: i32,
    pub carbs_g: i32,
    pub fat_g: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub name: String,
    pub amount: f64,
    pub unit: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// How the recipe came to exist. AI-generated recipes are created once from a
/// validated gateway payload and behave like manual ones afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipeSource {
    Manual,
    AiGenerated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
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
    pub source: RecipeSource,
    pub is_public: bool,
    pub owner_id: String,
}

/// Payload for creating a recipe; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecipe {
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
    pub source: RecipeSource,
    pub is_public: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipe_source_serialization_matches_wire_contract() {
        assert_eq!(
            serde_json::to_string(&RecipeSource::AiGenerated).unwrap(),
            "\"ai_generated\""
        );
        assert_eq!(
            serde_json::to_string(&RecipeSource::Manual).unwrap(),
            "\"manual\""
        );
    }

    #[test]
    fn recipe_round_trips_camel_case_fields() {
        let json = serde_json::json!({
            "id": "r1",
            "name": "Dal",
            "description": "Lentils",
            "cuisine": "indian",
            "difficulty": "easy",
            "prepTimeMinutes": 10,
            "cookTimeMinutes": 30,
            "servings": 4,
            "ingredients": [{ "name": "Lentils", "amount": 200.0, "unit": "g" }],
            "instructions": "Simmer.",
            "nutrition": { "calories": 500, "proteinG": 25, "carbsG": 60, "fatG": 10 },
            "source": "manual",
            "isPublic": false,
            "ownerId": "u1",
        });
        let recipe: Recipe = serde_json::from_value(json).unwrap();
        assert_eq!(recipe.nutrition.protein_g, 25);
        assert_eq!(recipe.ingredients[0].unit, "g");
    }
}
