//! Shopping domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category used when no inventory item matched an aggregated ingredient.
pub const DEFAULT_CATEGORY: &str = "other";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingItem {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub category: String,
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingList {
    pub id: String,
    /// Plan this list was derived from; ad-hoc lists have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    pub items: Vec<ShoppingItem>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Outcome of folding checked items back into inventory. Fold-back is not
/// atomic: each item either folded or failed, and the list reflects exactly
/// the folded ones being gone.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FoldBackReport {
    pub folded: Vec<String>,
    pub failed: Vec<FoldBackFailure>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FoldBackFailure {
    pub item: String,
    pub error: String,
}
