//! Meal-plan domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanDuration {
    Week,
    Month,
}

impl PlanDuration {
    pub fn days(&self) -> usize {
        match self {
            Self::Week => 7,
            Self::Month => 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    pub name: String,
    pub meal_type: MealType,
    /// Source recipe when the meal was drawn from the pool; generated meals
    /// carry their own nutrition and no recipe id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<String>,
    pub calories: i32,
    pub protein_g: i32,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Day {
    pub name: String,
    pub meals: Vec<Meal>,
}

impl Day {
    /// Exactly the sum of the meals' calories; no independent stored total.
    pub fn total_calories(&self) -> i32 {
        self.meals.iter().map(|meal| meal.calories).sum()
    }

    pub fn total_protein(&self) -> i32 {
        self.meals.iter().map(|meal| meal.protein_g).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlan {
    pub id: String,
    pub name: String,
    pub duration: PlanDuration,
    pub cuisines: Vec<String>,
    pub include_custom_recipes: bool,
    pub days: Vec<Day>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_totals_are_exact_sums() {
        let day = Day {
            name: "Day 1".into(),
            meals: vec![
                Meal {
                    name: "Dal".into(),
                    meal_type: MealType::Lunch,
                    recipe_id: Some("r1".into()),
                    calories: 500,
                    protein_g: 25,
                    completed: false,
                },
                Meal {
                    name: "Dal".into(),
                    meal_type: MealType::Dinner,
                    recipe_id: Some("r1".into()),
                    calories: 500,
                    protein_g: 25,
                    completed: false,
                },
            ],
        };
        assert_eq!(day.total_calories(), 1000);
        assert_eq!(day.total_protein(), 50);
    }

    #[test]
    fn duration_day_counts() {
        assert_eq!(PlanDuration::Week.days(), 7);
        assert_eq!(PlanDuration::Month.days(), 30);
    }
}
