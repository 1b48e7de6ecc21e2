//! Profile domain models.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    LoseWeight,
    Maintain,
    GainMuscle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    Free,
    Premium,
}

/// Per-user profile singleton. Every field has a default so a user who never
/// completed onboarding still gets a working plan derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diet: Option<String>,
    pub allergies: Vec<String>,
    pub dislikes: Vec<String>,
    pub goal: Goal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_weight_kg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_weight_kg: Option<f64>,
    pub target_calories: i32,
    pub meals_per_day: u32,
    pub preferred_cuisines: Vec<String>,
    pub max_cooking_minutes: i32,
    pub subscription_tier: SubscriptionTier,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            diet: None,
            allergies: Vec::new(),
            dislikes: Vec::new(),
            goal: Goal::Maintain,
            target_weight_kg: None,
            current_weight_kg: None,
            target_calories: 2000,
            meals_per_day: 3,
            preferred_cuisines: Vec::new(),
            max_cooking_minutes: 60,
            subscription_tier: SubscriptionTier::Free,
        }
    }
}

/// Per-user notification preference singleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationPreferences {
    pub push_enabled: bool,
    pub email_enabled: bool,
    pub meal_reminders: bool,
    pub plan_updates: bool,
    pub recipe_updates: bool,
    pub shopping_reminders: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            push_enabled: true,
            email_enabled: false,
            meal_reminders: true,
            plan_updates: true,
            recipe_updates: true,
            shopping_reminders: true,
        }
    }
}
