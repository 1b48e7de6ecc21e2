//! In-process [`RemoteStore`] used by tests and offline demos.
//!
//! Behaves like the real backend as seen through the boundary: every mutation
//! fans out a full filtered snapshot to each live watch on the affected
//! (kind, owner) pair, and a watch emits its initial snapshot immediately.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::{Error, Result};
use crate::store::{ChangeSink, CollectionEvent, EntityKind, RemoteStore, RemoteWatch, Scope};

#[derive(Default)]
struct Inner {
    collections: HashMap<(EntityKind, String), Vec<Value>>,
    watches: HashMap<u64, WatchEntry>,
    next_watch_id: u64,
    // (writes until failure, error); 1 fails the next write.
    injected_failure: Option<(u32, Error)>,
}

struct WatchEntry {
    kind: EntityKind,
    scope: Scope,
    sink: ChangeSink,
    cancelled: Arc<AtomicBool>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn filtered_view(inner: &Inner, kind: EntityKind, scope: &Scope) -> Vec<Value> {
        inner
            .collections
            .get(&(kind, scope.owner_id.clone()))
            .map(|docs| {
                docs.iter()
                    .filter(|doc| scope.filter.matches(doc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Fan out fresh snapshots to every live watch on (kind, owner).
    fn notify(&self, kind: EntityKind, owner_id: &str) {
        let pending: Vec<(ChangeSink, Vec<Value>)> = {
            let inner = self.inner.lock().expect("memory store lock");
            inner
                .watches
                .values()
                .filter(|entry| {
                    entry.kind == kind
                        && entry.scope.owner_id == owner_id
                        && !entry.cancelled.load(Ordering::SeqCst)
                })
                .map(|entry| {
                    (
                        Arc::clone(&entry.sink),
                        Self::filtered_view(&inner, kind, &entry.scope),
                    )
                })
                .collect()
        };
        for (sink, snapshot) in pending {
            sink(CollectionEvent::Snapshot(snapshot));
        }
    }

    fn take_injected_failure(inner: &mut Inner) -> Result<()> {
        match inner.injected_failure.take() {
            Some((1, err)) => Err(err),
            Some((n, err)) => {
                inner.injected_failure = Some((n - 1, err));
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
impl MemoryStore {
    /// Make the next write operation fail with the given error.
    pub fn fail_next_write(&self, err: Error) {
        self.fail_nth_write(1, err);
    }

    /// Make the `n`th write from now fail; the writes before it succeed.
    pub fn fail_nth_write(&self, n: u32, err: Error) {
        self.inner.lock().expect("memory store lock").injected_failure = Some((n, err));
    }

    /// Emit a terminal failure to every live watch on (kind, owner).
    pub fn fail_watches(&self, kind: EntityKind, owner_id: &str, message: &str) {
        let sinks: Vec<ChangeSink> = {
            let inner = self.inner.lock().expect("memory store lock");
            inner
                .watches
                .values()
                .filter(|entry| entry.kind == kind && entry.scope.owner_id == owner_id)
                .map(|entry| Arc::clone(&entry.sink))
                .collect()
        };
        for sink in sinks {
            sink(CollectionEvent::Failed(message.to_string()));
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn watch(&self, kind: EntityKind, scope: Scope, sink: ChangeSink) -> Result<RemoteWatch> {
        let cancelled = Arc::new(AtomicBool::new(false));
        let (watch_id, initial) = {
            let mut inner = self.inner.lock().expect("memory store lock");
            let watch_id = inner.next_watch_id;
            inner.next_watch_id += 1;
            let initial = Self::filtered_view(&inner, kind, &scope);
            inner.watches.insert(
                watch_id,
                WatchEntry {
                    kind,
                    scope,
                    sink: Arc::clone(&sink),
                    cancelled: Arc::clone(&cancelled),
                },
            );
            (watch_id, initial)
        };
        sink(CollectionEvent::Snapshot(initial));

        let inner = Arc::clone(&self.inner);
        Ok(RemoteWatch::new(move || {
            cancelled.store(true, Ordering::SeqCst);
            inner
                .lock()
                .expect("memory store lock")
                .watches
                .remove(&watch_id);
        }))
    }

    async fn list(&self, kind: EntityKind, scope: &Scope) -> Result<Vec<Value>> {
        let inner = self.inner.lock().expect("memory store lock");
        Ok(Self::filtered_view(&inner, kind, scope))
    }

    async fn get(&self, kind: EntityKind, owner_id: &str, id: &str) -> Result<Value> {
        let inner = self.inner.lock().expect("memory store lock");
        inner
            .collections
            .get(&(kind, owner_id.to_string()))
            .and_then(|docs| docs.iter().find(|doc| super::doc_id(doc) == Some(id)))
            .cloned()
            .ok_or_else(|| Error::not_found(kind, id))
    }

    async fn create(&self, kind: EntityKind, owner_id: &str, mut doc: Value) -> Result<String> {
        let id = {
            let mut inner = self.inner.lock().expect("memory store lock");
            Self::take_injected_failure(&mut inner)?;
            let object = doc
                .as_object_mut()
                .ok_or_else(|| Error::validation("document must be a JSON object"))?;
            let id = match object.get("id").and_then(Value::as_str) {
                Some(existing) if !existing.is_empty() => existing.to_string(),
                _ => Uuid::new_v4().to_string(),
            };
            object.insert("id".to_string(), Value::String(id.clone()));
            inner
                .collections
                .entry((kind, owner_id.to_string()))
                .or_default()
                .push(doc);
            id
        };
        self.notify(kind, owner_id);
        Ok(id)
    }

    async fn update(&self, kind: EntityKind, owner_id: &str, id: &str, patch: Value) -> Result<()> {
        {
            let mut inner = self.inner.lock().expect("memory store lock");
            Self::take_injected_failure(&mut inner)?;
            let fields = patch
                .as_object()
                .ok_or_else(|| Error::validation("patch must be a JSON object"))?
                .clone();
            let docs = inner
                .collections
                .get_mut(&(kind, owner_id.to_string()))
                .ok_or_else(|| Error::not_found(kind, id))?;
            let doc = docs
                .iter_mut()
                .find(|doc| super::doc_id(doc) == Some(id))
                .ok_or_else(|| Error::not_found(kind, id))?;
            let object = doc
                .as_object_mut()
                .ok_or_else(|| Error::validation("stored document must be a JSON object"))?;
            for (key, value) in fields {
                object.insert(key, value);
            }
        }
        self.notify(kind, owner_id);
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, owner_id: &str, id: &str) -> Result<()> {
        {
            let mut inner = self.inner.lock().expect("memory store lock");
            Self::take_injected_failure(&mut inner)?;
            let docs = inner
                .collections
                .get_mut(&(kind, owner_id.to_string()))
                .ok_or_else(|| Error::not_found(kind, id))?;
            let before = docs.len();
            docs.retain(|doc| super::doc_id(doc) != Some(id));
            if docs.len() == before {
                return Err(Error::not_found(kind, id));
            }
        }
        self.notify(kind, owner_id);
        Ok(())
    }

    async fn upsert_singleton(&self, kind: EntityKind, owner_id: &str, mut doc: Value) -> Result<()> {
        {
            let mut inner = self.inner.lock().expect("memory store lock");
            Self::take_injected_failure(&mut inner)?;
            let object = doc
                .as_object_mut()
                .ok_or_else(|| Error::validation("document must be a JSON object"))?;
            if !object.contains_key("id") {
                object.insert("id".to_string(), Value::String(owner_id.to_string()));
            }
            inner
                .collections
                .insert((kind, owner_id.to_string()), vec![doc]);
        }
        self.notify(kind, owner_id);
        Ok(())
    }

    async fn set_active_plan(&self, owner_id: &str, plan_id: &str) -> Result<()> {
        {
            let mut inner = self.inner.lock().expect("memory store lock");
            Self::take_injected_failure(&mut inner)?;
            let docs = inner
                .collections
                .get_mut(&(EntityKind::MealPlan, owner_id.to_string()))
                .ok_or_else(|| Error::not_found(EntityKind::MealPlan, plan_id))?;
            if !docs.iter().any(|doc| super::doc_id(doc) == Some(plan_id)) {
                return Err(Error::not_found(EntityKind::MealPlan, plan_id));
            }
            // One transaction: old active off, new active on.
            for doc in docs.iter_mut() {
                let is_target = super::doc_id(doc) == Some(plan_id);
                if let Some(object) = doc.as_object_mut() {
                    object.insert("active".to_string(), Value::Bool(is_target));
                }
            }
        }
        self.notify(EntityKind::MealPlan, owner_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex as StdMutex;

    fn collect_sink() -> (ChangeSink, Arc<StdMutex<Vec<CollectionEvent>>>) {
        let events = Arc::new(StdMutex::new(Vec::new()));
        let events_inner = Arc::clone(&events);
        let sink: ChangeSink = Arc::new(move |event| {
            events_inner.lock().unwrap().push(event);
        });
        (sink, events)
    }

    fn snapshots(events: &Arc<StdMutex<Vec<CollectionEvent>>>) -> Vec<Vec<Value>> {
        events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                CollectionEvent::Snapshot(docs) => Some(docs.clone()),
                CollectionEvent::Failed(_) => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn watch_emits_initial_snapshot_then_mutations() {
        let store = MemoryStore::new();
        store
            .create(EntityKind::Recipe, "u1", json!({ "name": "Dal" }))
            .await
            .unwrap();

        let (sink, events) = collect_sink();
        let watch = store
            .watch(EntityKind::Recipe, Scope::owned("u1"), sink)
            .await
            .unwrap();
        assert_eq!(snapshots(&events).len(), 1);
        assert_eq!(snapshots(&events)[0].len(), 1);

        store
            .create(EntityKind::Recipe, "u1", json!({ "name": "Ramen" }))
            .await
            .unwrap();
        assert_eq!(snapshots(&events).len(), 2);
        assert_eq!(snapshots(&events)[1].len(), 2);

        watch.cancel();
        store
            .create(EntityKind::Recipe, "u1", json!({ "name": "Tacos" }))
            .await
            .unwrap();
        assert_eq!(snapshots(&events).len(), 2);
    }

    #[tokio::test]
    async fn update_is_a_shallow_merge() {
        let store = MemoryStore::new();
        let id = store
            .create(
                EntityKind::InventoryItem,
                "u1",
                json!({ "name": "Tomato", "quantity": 2.0, "unit": "kg" }),
            )
            .await
            .unwrap();
        store
            .update(EntityKind::InventoryItem, "u1", &id, json!({ "quantity": 3.5 }))
            .await
            .unwrap();

        let doc = store.get(EntityKind::InventoryItem, "u1", &id).await.unwrap();
        assert_eq!(doc["quantity"], json!(3.5));
        assert_eq!(doc["unit"], json!("kg"));
    }

    #[tokio::test]
    async fn set_active_plan_leaves_exactly_one_active() {
        let store = MemoryStore::new();
        let a = store
            .create(EntityKind::MealPlan, "u1", json!({ "name": "A", "active": true }))
            .await
            .unwrap();
        let b = store
            .create(EntityKind::MealPlan, "u1", json!({ "name": "B", "active": false }))
            .await
            .unwrap();

        store.set_active_plan("u1", &b).await.unwrap();
        let doc_a = store.get(EntityKind::MealPlan, "u1", &a).await.unwrap();
        let doc_b = store.get(EntityKind::MealPlan, "u1", &b).await.unwrap();
        assert_eq!(doc_a["active"], json!(false));
        assert_eq!(doc_b["active"], json!(true));

        assert!(store
            .set_active_plan("u1", "missing")
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn unread_only_scope_narrows_snapshots() {
        let store = MemoryStore::new();
        store
            .create(EntityKind::Notification, "u1", json!({ "title": "a", "read": false }))
            .await
            .unwrap();
        store
            .create(EntityKind::Notification, "u1", json!({ "title": "b", "read": true }))
            .await
            .unwrap();

        let (sink, events) = collect_sink();
        let _watch = store
            .watch(
                EntityKind::Notification,
                Scope::filtered("u1", crate::store::ScopeFilter::UnreadOnly),
                sink,
            )
            .await
            .unwrap();
        let initial = snapshots(&events);
        assert_eq!(initial[0].len(), 1);
        assert_eq!(initial[0][0]["title"], json!("a"));
    }
}
