//! Shopping service: list derivation, optimistic check toggles, fold-back.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};

use crate::context::UserContext;
use crate::errors::{Error, Result};
use crate::inventory::{InventoryRepository, NewInventoryItem};
use crate::plans::PlanRepository;
use crate::recipes::RecipeRepository;
use crate::shopping::{
    aggregate, plan_requirements, FoldBackFailure, FoldBackReport, ShoppingItem,
    ShoppingList, ShoppingRepository,
};
use crate::store::{EntityKind, Scope};
use crate::sync::{MutationCoordinator, SubscriptionManager};

#[async_trait]
pub trait ShoppingServiceTrait: Send + Sync {
    async fn list(&self, ctx: &UserContext) -> Result<Vec<ShoppingList>>;

    /// Derive a shopping list for a plan: sum its ingredient requirements,
    /// subtract current inventory, persist the remainder.
    async fn generate_for_plan(&self, ctx: &UserContext, plan_id: &str) -> Result<ShoppingList>;

    /// Optimistically toggle one item's checked flag within the given scope.
    async fn toggle_item(
        &self,
        ctx: &UserContext,
        scope: &Scope,
        list_id: &str,
        item_index: usize,
    ) -> Result<()>;

    /// Fold every checked item back into inventory, one confirmed write at a
    /// time: increment the matching inventory item or create a new one, then
    /// drop the item from the list. Items that fail stay on the list with
    /// their inventory write undone, so a retry never folds a quantity twice;
    /// the report says which went where. Nothing checked is a conflict.
    async fn fold_checked(&self, ctx: &UserContext, list_id: &str) -> Result<FoldBackReport>;

    async fn delete(&self, ctx: &UserContext, id: &str) -> Result<()>;
}

pub struct ShoppingService {
    repository: Arc<ShoppingRepository>,
    plans: Arc<PlanRepository>,
    recipes: Arc<RecipeRepository>,
    inventory: Arc<InventoryRepository>,
    subscriptions: Arc<SubscriptionManager>,
    coordinator: Arc<MutationCoordinator>,
}

impl ShoppingService {
    pub fn new(
        repository: Arc<ShoppingRepository>,
        plans: Arc<PlanRepository>,
        recipes: Arc<RecipeRepository>,
        inventory: Arc<InventoryRepository>,
        subscriptions: Arc<SubscriptionManager>,
        coordinator: Arc<MutationCoordinator>,
    ) -> Self {
        Self {
            repository,
            plans,
            recipes,
            inventory,
            subscriptions,
            coordinator,
        }
    }

    /// Move one item's quantity into inventory; the returned undo reverses
    /// exactly that write.
    async fn fold_one(&self, ctx: &UserContext, item: &ShoppingItem) -> Result<FoldUndo> {
        let stocked = self.inventory.list(ctx).await?;
        match stocked
            .iter()
            .find(|existing| existing.matches(&item.name, &item.unit))
        {
            Some(existing) => {
                self.inventory
                    .set_quantity(ctx, &existing.id, existing.quantity + item.quantity)
                    .await?;
                Ok(FoldUndo::Reset {
                    id: existing.id.clone(),
                    quantity: existing.quantity,
                })
            }
            None => {
                let created = self
                    .inventory
                    .create(
                        ctx,
                        NewInventoryItem {
                            name: item.name.clone(),
                            quantity: item.quantity,
                            unit: item.unit.clone(),
                            nutrition: None,
                            category: item.category.clone(),
                        },
                    )
                    .await?;
                Ok(FoldUndo::Remove { id: created.id })
            }
        }
    }

    async fn unfold(&self, ctx: &UserContext, undo: FoldUndo) -> Result<()> {
        match undo {
            FoldUndo::Reset { id, quantity } => self.inventory.set_quantity(ctx, &id, quantity).await,
            FoldUndo::Remove { id } => self.inventory.delete(ctx, &id).await,
        }
    }
}

/// How to reverse one fold-back inventory write.
enum FoldUndo {
    Reset { id: String, quantity: f64 },
    Remove { id: String },
}

#[async_trait]
impl ShoppingServiceTrait for ShoppingService {
    async fn list(&self, ctx: &UserContext) -> Result<Vec<ShoppingList>> {
        self.repository.list(ctx).await
    }

    async fn generate_for_plan(&self, ctx: &UserContext, plan_id: &str) -> Result<ShoppingList> {
        let plan = self.plans.get(ctx, plan_id).await?;
        let mut recipes = self.recipes.list_library().await?;
        recipes.extend(self.recipes.list(ctx).await?);

        let requirements = plan_requirements(&plan, &recipes);
        let stocked = self.inventory.list(ctx).await?;
        let items = aggregate(&requirements, &stocked);
        debug!(
            "plan '{}' needs {} ingredients, {} left to buy",
            plan_id,
            requirements.len(),
            items.len()
        );
        self.repository.create(ctx, Some(plan_id), items).await
    }

    async fn toggle_item(
        &self,
        ctx: &UserContext,
        scope: &Scope,
        list_id: &str,
        item_index: usize,
    ) -> Result<()> {
        let cached = self
            .subscriptions
            .cached_doc(EntityKind::ShoppingList, scope, list_id)
            .ok_or_else(|| Error::not_found(EntityKind::ShoppingList, list_id))?;
        let list: ShoppingList = serde_json::from_value(cached)?;
        let mut items = list.items;
        let item = items
            .get_mut(item_index)
            .ok_or_else(|| Error::validation("shopping item index out of range"))?;
        item.checked = !item.checked;

        let items_value = serde_json::to_value(&items)?;
        self.coordinator
            .apply_one(
                EntityKind::ShoppingList,
                scope,
                list_id,
                move |doc| {
                    let mut next = doc.clone();
                    next["items"] = items_value;
                    next
                },
                self.repository.set_items(ctx, list_id, &items),
            )
            .await
    }

    async fn fold_checked(&self, ctx: &UserContext, list_id: &str) -> Result<FoldBackReport> {
        let list = self.repository.get(ctx, list_id).await?;
        let checked: Vec<ShoppingItem> = list
            .items
            .iter()
            .filter(|item| item.checked)
            .cloned()
            .collect();
        if checked.is_empty() {
            return Err(Error::conflict("no checked items to fold back"));
        }

        let mut remaining = list.items;
        let mut report = FoldBackReport::default();
        for item in checked {
            let folded = match self.fold_one(ctx, &item).await {
                Ok(undo) => {
                    // Drop the folded item, then persist the shrunken list so
                    // partial progress is visible after any later failure.
                    let position = remaining.iter().position(|candidate| {
                        candidate.checked
                            && candidate.name == item.name
                            && candidate.unit == item.unit
                    });
                    if let Some(position) = position {
                        remaining.remove(position);
                    }
                    match self.repository.set_items(ctx, list_id, &remaining).await {
                        Ok(()) => Ok(()),
                        Err(err) => {
                            // The quantity landed in inventory but the item
                            // stays on the list; undo the inventory write so
                            // a retry does not fold it a second time.
                            if let Some(position) = position {
                                remaining.insert(position, item.clone());
                            }
                            if let Err(undo_err) = self.unfold(ctx, undo).await {
                                warn!(
                                    "undo of inventory fold for '{}' failed: {}",
                                    item.name, undo_err
                                );
                            }
                            Err(err)
                        }
                    }
                }
                Err(err) => Err(err),
            };
            match folded {
                Ok(()) => report.folded.push(item.name),
                Err(err) => {
                    warn!("fold-back of '{}' failed: {}", item.name, err);
                    report.failed.push(FoldBackFailure {
                        item: item.name,
                        error: err.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }

    async fn delete(&self, ctx: &UserContext, id: &str) -> Result<()> {
        self.repository.delete(ctx, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plans::{Day, Meal, MealPlan, MealType, PlanDuration};
    use crate::recipes::{
        Difficulty, Ingredient, NewRecipe, NutritionFacts, RecipeSource, SHARED_LIBRARY_OWNER,
    };
    use crate::store::{MemoryStore, RemoteStore};
    use crate::sync::{ChangeCallback, ErrorCallback};
    use chrono::Utc;
    use serde_json::json;

    struct Fixture {
        store: Arc<MemoryStore>,
        service: ShoppingService,
        manager: Arc<SubscriptionManager>,
        ctx: UserContext,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let remote: Arc<dyn RemoteStore> = Arc::clone(&store) as Arc<dyn RemoteStore>;
        let manager = Arc::new(SubscriptionManager::new(Arc::clone(&remote)));
        let service = ShoppingService::new(
            Arc::new(ShoppingRepository::new(Arc::clone(&remote))),
            Arc::new(PlanRepository::new(Arc::clone(&remote))),
            Arc::new(RecipeRepository::new(Arc::clone(&remote))),
            Arc::new(InventoryRepository::new(Arc::clone(&remote))),
            Arc::clone(&manager),
            Arc::new(MutationCoordinator::new(Arc::clone(&manager))),
        );
        Fixture {
            store,
            service,
            manager,
            ctx: UserContext::resolve(Some("u1")).unwrap(),
        }
    }

    async fn seed_library_recipe(store: &Arc<MemoryStore>, ingredients: Vec<Ingredient>) -> String {
        let mut doc = serde_json::to_value(NewRecipe {
            name: "Dal".into(),
            description: String::new(),
            cuisine: "indian".into(),
            difficulty: Difficulty::Easy,
            prep_time_minutes: 10,
            cook_time_minutes: 20,
            servings: 2,
            ingredients,
            instructions: "Simmer.".into(),
            nutrition: NutritionFacts {
                calories: 500,
                protein_g: 25,
                carbs_g: 40,
                fat_g: 8,
            },
            source: RecipeSource::Manual,
            is_public: true,
        })
        .unwrap();
        doc.as_object_mut()
            .unwrap()
            .insert("ownerId".into(), json!(SHARED_LIBRARY_OWNER));
        store
            .create(EntityKind::Recipe, SHARED_LIBRARY_OWNER, doc)
            .await
            .unwrap()
    }

    async fn seed_plan(fixture: &Fixture, recipe_id: &str, meals: usize) -> String {
        let plan = MealPlan {
            id: String::new(),
            name: "Plan".into(),
            duration: PlanDuration::Week,
            cuisines: vec![],
            include_custom_recipes: false,
            days: vec![Day {
                name: "Day 1".into(),
                meals: (0..meals)
                    .map(|_| Meal {
                        name: "Dal".into(),
                        meal_type: MealType::Lunch,
                        recipe_id: Some(recipe_id.to_string()),
                        calories: 500,
                        protein_g: 25,
                        completed: false,
                    })
                    .collect(),
            }],
            starts_at: Utc::now(),
            ends_at: Utc::now(),
            active: false,
        };
        let plans = PlanRepository::new(Arc::clone(&fixture.store) as Arc<dyn RemoteStore>);
        plans.create(&fixture.ctx, &plan).await.unwrap().id
    }

    fn tomato(amount: f64) -> Ingredient {
        Ingredient {
            name: "Tomato".into(),
            amount,
            unit: "g".into(),
        }
    }

    #[tokio::test]
    async fn generated_list_holds_the_uncovered_remainder() {
        let fixture = fixture();
        let recipe_id = seed_library_recipe(&fixture.store, vec![tomato(250.0)]).await;
        let plan_id = seed_plan(&fixture, &recipe_id, 2).await;
        let inventory = InventoryRepository::new(Arc::clone(&fixture.store) as Arc<dyn RemoteStore>);
        inventory
            .create(
                &fixture.ctx,
                NewInventoryItem {
                    name: "tomato".into(),
                    quantity: 200.0,
                    unit: "g".into(),
                    nutrition: None,
                    category: "produce".into(),
                },
            )
            .await
            .unwrap();

        let list = fixture
            .service
            .generate_for_plan(&fixture.ctx, &plan_id)
            .await
            .unwrap();
        assert_eq!(list.plan_id.as_deref(), Some(plan_id.as_str()));
        assert_eq!(list.items.len(), 1);
        // 500 g needed, 200 g on hand.
        assert_eq!(list.items[0].quantity, 300.0);
        assert_eq!(list.items[0].category, "produce");
    }

    async fn subscribed(fixture: &Fixture) -> (Scope, crate::sync::Subscription) {
        let scope = Scope::owned("u1");
        let on_change: ChangeCallback = Arc::new(|_| {});
        let on_error: ErrorCallback = Arc::new(|_| {});
        let sub = fixture
            .manager
            .subscribe(
                EntityKind::ShoppingList,
                scope.clone(),
                on_change,
                on_error,
            )
            .await
            .unwrap();
        (scope, sub)
    }

    async fn seed_list(fixture: &Fixture, items: Vec<ShoppingItem>) -> String {
        let repository =
            ShoppingRepository::new(Arc::clone(&fixture.store) as Arc<dyn RemoteStore>);
        repository
            .create(&fixture.ctx, None, items)
            .await
            .unwrap()
            .id
    }

    fn item(name: &str, quantity: f64, checked: bool) -> ShoppingItem {
        ShoppingItem {
            name: name.into(),
            quantity,
            unit: "g".into(),
            category: "produce".into(),
            checked,
        }
    }

    #[tokio::test]
    async fn toggle_flips_the_cached_item() {
        let fixture = fixture();
        let list_id = seed_list(&fixture, vec![item("Tomato", 300.0, false)]).await;
        let (scope, _sub) = subscribed(&fixture).await;

        fixture
            .service
            .toggle_item(&fixture.ctx, &scope, &list_id, 0)
            .await
            .unwrap();

        let doc = fixture
            .manager
            .cached_doc(EntityKind::ShoppingList, &scope, &list_id)
            .unwrap();
        assert_eq!(doc["items"][0]["checked"], json!(true));
    }

    #[tokio::test]
    async fn failed_toggle_rolls_the_item_back() {
        let fixture = fixture();
        let list_id = seed_list(&fixture, vec![item("Tomato", 300.0, false)]).await;
        let (scope, _sub) = subscribed(&fixture).await;

        fixture.store.fail_next_write(Error::remote("backend down"));
        let err = fixture
            .service
            .toggle_item(&fixture.ctx, &scope, &list_id, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Remote(_)));

        let doc = fixture
            .manager
            .cached_doc(EntityKind::ShoppingList, &scope, &list_id)
            .unwrap();
        assert_eq!(doc["items"][0]["checked"], json!(false));
    }

    #[tokio::test]
    async fn fold_back_moves_checked_items_into_inventory() {
        let fixture = fixture();
        let list_id = seed_list(
            &fixture,
            vec![item("Tomato", 300.0, true), item("Rice", 200.0, false)],
        )
        .await;
        let inventory = InventoryRepository::new(Arc::clone(&fixture.store) as Arc<dyn RemoteStore>);
        inventory
            .create(
                &fixture.ctx,
                NewInventoryItem {
                    name: "tomato".into(),
                    quantity: 100.0,
                    unit: "g".into(),
                    nutrition: None,
                    category: "produce".into(),
                },
            )
            .await
            .unwrap();

        let report = fixture
            .service
            .fold_checked(&fixture.ctx, &list_id)
            .await
            .unwrap();
        assert_eq!(report.folded, vec!["Tomato".to_string()]);
        assert!(report.failed.is_empty());

        // Inventory incremented, unchecked item untouched.
        let stocked = inventory.list(&fixture.ctx).await.unwrap();
        assert_eq!(stocked.len(), 1);
        assert_eq!(stocked[0].quantity, 400.0);
        let repository =
            ShoppingRepository::new(Arc::clone(&fixture.store) as Arc<dyn RemoteStore>);
        let list = repository.get(&fixture.ctx, &list_id).await.unwrap();
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.items[0].name, "Rice");
    }

    #[tokio::test]
    async fn fold_back_complements_aggregation() {
        let fixture = fixture();
        let recipe_id = seed_library_recipe(&fixture.store, vec![tomato(250.0)]).await;
        let plan_id = seed_plan(&fixture, &recipe_id, 2).await;

        let list = fixture
            .service
            .generate_for_plan(&fixture.ctx, &plan_id)
            .await
            .unwrap();
        assert_eq!(list.items.len(), 1);

        // Check everything and fold it back into inventory.
        let repository =
            ShoppingRepository::new(Arc::clone(&fixture.store) as Arc<dyn RemoteStore>);
        let checked: Vec<ShoppingItem> = list
            .items
            .iter()
            .cloned()
            .map(|mut item| {
                item.checked = true;
                item
            })
            .collect();
        repository
            .set_items(&fixture.ctx, &list.id, &checked)
            .await
            .unwrap();
        let report = fixture
            .service
            .fold_checked(&fixture.ctx, &list.id)
            .await
            .unwrap();
        assert!(report.failed.is_empty());

        // Everything the plan needs is now on hand.
        let again = fixture
            .service
            .generate_for_plan(&fixture.ctx, &plan_id)
            .await
            .unwrap();
        assert!(again.items.is_empty());
    }

    #[tokio::test]
    async fn failed_list_write_undoes_the_inventory_increment() {
        let fixture = fixture();
        let list_id = seed_list(&fixture, vec![item("Tomato", 300.0, true)]).await;
        let inventory = InventoryRepository::new(Arc::clone(&fixture.store) as Arc<dyn RemoteStore>);
        inventory
            .create(
                &fixture.ctx,
                NewInventoryItem {
                    name: "tomato".into(),
                    quantity: 100.0,
                    unit: "g".into(),
                    nutrition: None,
                    category: "produce".into(),
                },
            )
            .await
            .unwrap();

        // First write increments inventory, second shrinks the list.
        fixture
            .store
            .fail_nth_write(2, Error::remote("backend down"));
        let report = fixture
            .service
            .fold_checked(&fixture.ctx, &list_id)
            .await
            .unwrap();
        assert!(report.folded.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].item, "Tomato");

        // The increment was rolled back, so a retry folds exactly once.
        let stocked = inventory.list(&fixture.ctx).await.unwrap();
        assert_eq!(stocked[0].quantity, 100.0);

        let retry = fixture
            .service
            .fold_checked(&fixture.ctx, &list_id)
            .await
            .unwrap();
        assert_eq!(retry.folded, vec!["Tomato".to_string()]);
        let stocked = inventory.list(&fixture.ctx).await.unwrap();
        assert_eq!(stocked[0].quantity, 400.0);
    }

    #[tokio::test]
    async fn failed_list_write_removes_the_created_inventory_item() {
        let fixture = fixture();
        let list_id = seed_list(&fixture, vec![item("Tomato", 300.0, true)]).await;

        fixture
            .store
            .fail_nth_write(2, Error::remote("backend down"));
        let report = fixture
            .service
            .fold_checked(&fixture.ctx, &list_id)
            .await
            .unwrap();
        assert_eq!(report.failed.len(), 1);

        // The freshly created inventory item is gone again and the item is
        // still checked on the list.
        let inventory = InventoryRepository::new(Arc::clone(&fixture.store) as Arc<dyn RemoteStore>);
        assert!(inventory.list(&fixture.ctx).await.unwrap().is_empty());
        let repository =
            ShoppingRepository::new(Arc::clone(&fixture.store) as Arc<dyn RemoteStore>);
        let list = repository.get(&fixture.ctx, &list_id).await.unwrap();
        assert_eq!(list.items.len(), 1);
        assert!(list.items[0].checked);
    }

    #[tokio::test]
    async fn fold_back_with_nothing_checked_is_a_conflict() {
        let fixture = fixture();
        let list_id = seed_list(&fixture, vec![item("Tomato", 300.0, false)]).await;
        let err = fixture
            .service
            .fold_checked(&fixture.ctx, &list_id)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn fold_back_reports_partial_failure_and_keeps_the_failed_item() {
        let fixture = fixture();
        let list_id = seed_list(
            &fixture,
            vec![item("Tomato", 300.0, true), item("Rice", 200.0, true)],
        )
        .await;

        // Per item: one inventory write then one list write. Failing the
        // third write hits the second item's inventory fold.
        fixture
            .store
            .fail_nth_write(3, Error::remote("backend down"));
        let report = fixture
            .service
            .fold_checked(&fixture.ctx, &list_id)
            .await
            .unwrap();
        assert_eq!(report.folded, vec!["Tomato".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].item, "Rice");

        let repository =
            ShoppingRepository::new(Arc::clone(&fixture.store) as Arc<dyn RemoteStore>);
        let list = repository.get(&fixture.ctx, &list_id).await.unwrap();
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.items[0].name, "Rice");
    }
}
