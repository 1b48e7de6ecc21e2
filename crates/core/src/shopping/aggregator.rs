//! Shopping aggregation: pure derivation of a shopping list from a plan's
//! ingredient requirements and the current inventory.
//!
//! Matching is by case-folded trimmed name plus exact unit; there is no unit
//! conversion, so "tomato 500 g" and "tomato 1 kg" are distinct lines. Only
//! positive remainders become items: covered ingredients disappear entirely.

use std::collections::HashMap;

use crate::inventory::InventoryItem;
use crate::plans::MealPlan;
use crate::recipes::Recipe;
use crate::shopping::{ShoppingItem, DEFAULT_CATEGORY};

/// One summed ingredient requirement, before inventory is subtracted.
#[derive(Debug, Clone, PartialEq)]
pub struct RequiredIngredient {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

fn fold_key(name: &str, unit: &str) -> (String, String) {
    (name.trim().to_ascii_lowercase(), unit.to_string())
}

/// Sum ingredient amounts over every meal of the plan that references a
/// recipe. Requirements keep first-appearance order and the first-seen
/// spelling of each name; meals without a recipe contribute nothing.
pub fn plan_requirements(plan: &MealPlan, recipes: &[Recipe]) -> Vec<RequiredIngredient> {
    let by_id: HashMap<&str, &Recipe> = recipes
        .iter()
        .map(|recipe| (recipe.id.as_str(), recipe))
        .collect();

    let mut order: Vec<(String, String)> = Vec::new();
    let mut summed: HashMap<(String, String), RequiredIngredient> = HashMap::new();

    for day in &plan.days {
        for meal in &day.meals {
            let Some(recipe) = meal
                .recipe_id
                .as_deref()
                .and_then(|id| by_id.get(id).copied())
            else {
                continue;
            };
            for ingredient in &recipe.ingredients {
                let key = fold_key(&ingredient.name, &ingredient.unit);
                match summed.get_mut(&key) {
                    Some(required) => required.quantity += ingredient.amount,
                    None => {
                        order.push(key.clone());
                        summed.insert(
                            key,
                            RequiredIngredient {
                                name: ingredient.name.trim().to_string(),
                                quantity: ingredient.amount,
                                unit: ingredient.unit.clone(),
                            },
                        );
                    }
                }
            }
        }
    }

    order
        .into_iter()
        .filter_map(|key| summed.remove(&key))
        .collect()
}

/// Subtract on-hand inventory from the requirements and emit the items still
/// to buy. Quantities are summed over every matching inventory row (direct
/// adds can leave several rows for one ingredient). The category comes from
/// the first matched row when there is one, otherwise [`DEFAULT_CATEGORY`].
pub fn aggregate(
    requirements: &[RequiredIngredient],
    inventory: &[InventoryItem],
) -> Vec<ShoppingItem> {
    requirements
        .iter()
        .filter_map(|required| {
            let on_hand: Vec<&InventoryItem> = inventory
                .iter()
                .filter(|item| item.matches(&required.name, &required.unit))
                .collect();
            let available: f64 = on_hand.iter().map(|item| item.quantity).sum();
            let remainder = required.quantity - available;
            if remainder <= 0.0 {
                return None;
            }
            Some(ShoppingItem {
                name: required.name.clone(),
                quantity: remainder,
                unit: required.unit.clone(),
                category: on_hand
                    .first()
                    .map(|item| item.category.clone())
                    .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
                checked: false,
            })
        })
        .collect()
}
