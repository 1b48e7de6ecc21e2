//! Typed, hook-like view over one subscription.
//!
//! Screens consume a [`CollectionView`]: current decoded items, a loading
//! flag, and the last terminal error. Decoding happens at this edge; the
//! subscription layer below stays JSON.

use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::Result;
use crate::store::{EntityKind, Scope};
use crate::sync::{ChangeCallback, ErrorCallback, Subscription, SubscriptionManager};

struct ViewState<T> {
    items: Vec<T>,
    loading: bool,
    error: Option<String>,
}

pub struct CollectionView<T> {
    state: Arc<Mutex<ViewState<T>>>,
    _subscription: Subscription,
}

impl<T> CollectionView<T>
where
    T: DeserializeOwned + Send + 'static,
{
    /// Subscribe and decode snapshots into `T`.
    ///
    /// A snapshot that fails to decode surfaces as the view's error without
    /// clearing the previous items; the subscription itself stays live.
    pub async fn open(
        manager: &Arc<SubscriptionManager>,
        kind: EntityKind,
        scope: Scope,
    ) -> Result<Self> {
        let state = Arc::new(Mutex::new(ViewState {
            items: Vec::new(),
            loading: true,
            error: None,
        }));

        let change_state = Arc::clone(&state);
        let on_change: ChangeCallback = Arc::new(move |docs: &[Value]| {
            let decoded: std::result::Result<Vec<T>, _> = docs
                .iter()
                .map(|doc| serde_json::from_value(doc.clone()))
                .collect();
            let mut state = change_state.lock().expect("view state lock");
            state.loading = false;
            match decoded {
                Ok(items) => {
                    state.items = items;
                    state.error = None;
                }
                Err(err) => state.error = Some(err.to_string()),
            }
        });

        let error_state = Arc::clone(&state);
        let on_error: ErrorCallback = Arc::new(move |err| {
            let mut state = error_state.lock().expect("view state lock");
            state.loading = false;
            state.error = Some(err.to_string());
        });

        let subscription = manager.subscribe(kind, scope, on_change, on_error).await?;
        Ok(Self {
            state,
            _subscription: subscription,
        })
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().expect("view state lock").loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().expect("view state lock").error.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().expect("view state lock").items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> CollectionView<T>
where
    T: DeserializeOwned + Clone + Send + 'static,
{
    /// Snapshot of the current decoded items.
    pub fn items(&self) -> Vec<T> {
        self.state.lock().expect("view state lock").items.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::Notification;
    use crate::store::{MemoryStore, RemoteStore, ScopeFilter};
    use serde_json::json;

    fn notification_doc(title: &str, read: bool) -> Value {
        json!({
            "kind": "system",
            "title": title,
            "message": "m",
            "read": read,
            "createdAt": "2026-01-01T00:00:00Z",
        })
    }

    #[tokio::test]
    async fn view_decodes_snapshots_and_clears_loading() {
        let store = Arc::new(MemoryStore::new());
        store
            .create(EntityKind::Notification, "u1", notification_doc("hello", false))
            .await
            .unwrap();
        let manager = Arc::new(SubscriptionManager::new(
            Arc::clone(&store) as Arc<dyn RemoteStore>
        ));

        let view: CollectionView<Notification> = CollectionView::open(
            &manager,
            EntityKind::Notification,
            Scope::filtered("u1", ScopeFilter::UnreadOnly),
        )
        .await
        .unwrap();

        assert!(!view.is_loading());
        assert_eq!(view.len(), 1);
        assert_eq!(view.items()[0].title, "hello");

        // Marking it read drops it from the unread-only scope.
        let id = view.items()[0].id.clone();
        store
            .update(EntityKind::Notification, "u1", &id, json!({ "read": true }))
            .await
            .unwrap();
        assert!(view.is_empty());
    }

    #[tokio::test]
    async fn terminal_error_lands_in_the_view() {
        let store = Arc::new(MemoryStore::new());
        let manager = Arc::new(SubscriptionManager::new(
            Arc::clone(&store) as Arc<dyn RemoteStore>
        ));
        let view: CollectionView<Notification> =
            CollectionView::open(&manager, EntityKind::Notification, Scope::owned("u1"))
                .await
                .unwrap();

        store.fail_watches(EntityKind::Notification, "u1", "stream broken");
        assert!(view.error().unwrap().contains("stream broken"));
    }
}
