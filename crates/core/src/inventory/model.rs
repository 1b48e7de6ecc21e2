//! Inventory domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::recipes::NutritionFacts;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<NutritionFacts>,
    pub category: String,
    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Name/unit matching used by aggregation and fold-back: names compare
    /// case-insensitively after trim, units compare exactly (no conversion).
    pub fn matches(&self, name: &str, unit: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim()) && self.unit == unit
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInventoryItem {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<NutritionFacts>,
    pub category: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, unit: &str) -> InventoryItem {
        InventoryItem {
            id: "i1".into(),
            name: name.into(),
            quantity: 1.0,
            unit: unit.into(),
            nutrition: None,
            category: "produce".into(),
            added_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn matching_ignores_name_case_but_not_unit() {
        assert!(item("Tomato", "g").matches("tomato", "g"));
        assert!(item(" Tomato ", "g").matches("tomato", "g"));
        assert!(!item("Tomato", "g").matches("tomato", "kg"));
    }
}
