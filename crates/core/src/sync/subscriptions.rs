//! Reference-counted subscription registry.
//!
//! Exactly one live remote watch exists per (kind, scope) pair; any number of
//! local listeners share it. The cached view held here is the only shared
//! mutable state in the core: it is replaced by incoming snapshots and
//! adjusted by the mutation coordinator's apply/rollback hooks, and nothing
//! else writes to it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use log::{debug, warn};
use serde_json::Value;

use crate::errors::{Error, Result};
use crate::store::{doc_id, CollectionEvent, EntityKind, RemoteStore, RemoteWatch, Scope};

/// Listener callback receiving the full current view for its scope.
pub type ChangeCallback = Arc<dyn Fn(&[Value]) + Send + Sync>;

/// Listener callback receiving the terminal error for its subscription.
pub type ErrorCallback = Arc<dyn Fn(&Error) + Send + Sync>;

type FeedKey = (EntityKind, Scope);

struct Listener {
    on_change: ChangeCallback,
    on_error: ErrorCallback,
}

struct Feed {
    listeners: HashMap<u64, Listener>,
    view: Option<Vec<Value>>,
    watch: Option<RemoteWatch>,
}

pub struct SubscriptionManager {
    store: Arc<dyn RemoteStore>,
    feeds: Mutex<HashMap<FeedKey, Feed>>,
    next_listener_id: AtomicU64,
}

impl SubscriptionManager {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            feeds: Mutex::new(HashMap::new()),
            next_listener_id: AtomicU64::new(1),
        }
    }

    /// Register a listener for (kind, scope).
    ///
    /// The first listener establishes the remote watch; later listeners share
    /// it and immediately replay the cached view when one exists. Dropping
    /// the returned [`Subscription`] releases the listener; the remote watch
    /// is torn down when the last one goes.
    pub async fn subscribe(
        self: &Arc<Self>,
        kind: EntityKind,
        scope: Scope,
        on_change: ChangeCallback,
        on_error: ErrorCallback,
    ) -> Result<Subscription> {
        let listener_id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        let key = (kind, scope.clone());
        let listener = Listener {
            on_change: Arc::clone(&on_change),
            on_error,
        };

        let needs_watch = {
            let mut feeds = self.feeds.lock().expect("subscription registry lock");
            match feeds.get_mut(&key) {
                Some(feed) => {
                    feed.listeners.insert(listener_id, listener);
                    let cached = feed.view.clone();
                    drop(feeds);
                    if let Some(view) = cached {
                        on_change(&view);
                    }
                    false
                }
                None => {
                    let mut listeners = HashMap::new();
                    listeners.insert(listener_id, listener);
                    feeds.insert(
                        key.clone(),
                        Feed {
                            listeners,
                            view: None,
                            watch: None,
                        },
                    );
                    true
                }
            }
        };

        if needs_watch {
            debug!("establishing remote watch for {} ({})", kind, scope.owner_id);
            let weak = Arc::downgrade(self);
            let sink_kind = kind;
            let sink_scope = scope.clone();
            let sink = Arc::new(move |event: CollectionEvent| {
                if let Some(manager) = weak.upgrade() {
                    manager.dispatch(sink_kind, &sink_scope, event);
                }
            });
            match self.store.watch(kind, scope.clone(), sink).await {
                Ok(watch) => {
                    let mut feeds = self.feeds.lock().expect("subscription registry lock");
                    match feeds.get_mut(&key) {
                        // The feed can be gone already if the watch delivered a
                        // terminal failure during setup.
                        Some(feed) => feed.watch = Some(watch),
                        None => watch.cancel(),
                    }
                }
                Err(err) => {
                    let removed = {
                        let mut feeds = self.feeds.lock().expect("subscription registry lock");
                        feeds.remove(&key)
                    };
                    // Listeners that joined while the watch call was pending
                    // still hear the failure; the initiator gets the Err.
                    if let Some(feed) = removed {
                        let failure = Error::remote(err.to_string());
                        for (id, listener) in feed.listeners {
                            if id != listener_id {
                                (listener.on_error)(&failure);
                            }
                        }
                    }
                    return Err(err);
                }
            }
        }

        Ok(Subscription {
            manager: Arc::downgrade(self),
            kind,
            scope,
            listener_id,
            released: false,
        })
    }

    /// Route a store event into the feed and out to its listeners.
    fn dispatch(&self, kind: EntityKind, scope: &Scope, event: CollectionEvent) {
        let key = (kind, scope.clone());
        match event {
            CollectionEvent::Snapshot(docs) => {
                let callbacks: Vec<ChangeCallback> = {
                    let mut feeds = self.feeds.lock().expect("subscription registry lock");
                    let Some(feed) = feeds.get_mut(&key) else {
                        return;
                    };
                    feed.view = Some(docs.clone());
                    feed.listeners
                        .values()
                        .map(|listener| Arc::clone(&listener.on_change))
                        .collect()
                };
                for callback in callbacks {
                    callback(&docs);
                }
            }
            CollectionEvent::Failed(message) => {
                // Terminal: the feed dies, every listener hears the error
                // once, and callers must re-subscribe explicitly.
                warn!("watch failed for {} ({}): {}", kind, scope.owner_id, message);
                let removed = {
                    let mut feeds = self.feeds.lock().expect("subscription registry lock");
                    feeds.remove(&key)
                };
                let Some(feed) = removed else {
                    return;
                };
                drop(feed.watch);
                let err = Error::remote(message);
                for listener in feed.listeners.values() {
                    (listener.on_error)(&err);
                }
            }
        }
    }

    fn unsubscribe(&self, kind: EntityKind, scope: &Scope, listener_id: u64) {
        let key = (kind, scope.clone());
        let torn_down = {
            let mut feeds = self.feeds.lock().expect("subscription registry lock");
            let Some(feed) = feeds.get_mut(&key) else {
                return;
            };
            feed.listeners.remove(&listener_id);
            if feed.listeners.is_empty() {
                feeds.remove(&key)
            } else {
                None
            }
        };
        if let Some(feed) = torn_down {
            debug!("tearing down remote watch for {} ({})", kind, scope.owner_id);
            drop(feed.watch);
        }
    }

    /// Cached copy of one document in the scoped view.
    pub fn cached_doc(&self, kind: EntityKind, scope: &Scope, id: &str) -> Option<Value> {
        let feeds = self.feeds.lock().expect("subscription registry lock");
        feeds
            .get(&(kind, scope.clone()))?
            .view
            .as_ref()?
            .iter()
            .find(|doc| doc_id(doc) == Some(id))
            .cloned()
    }

    /// Cached copy of a singleton scope's only document.
    pub fn cached_singleton(&self, kind: EntityKind, scope: &Scope) -> Option<Value> {
        let feeds = self.feeds.lock().expect("subscription registry lock");
        feeds
            .get(&(kind, scope.clone()))?
            .view
            .as_ref()?
            .first()
            .cloned()
    }

    /// Cached full view for the scope, if one has been received.
    pub fn cached_view(&self, kind: EntityKind, scope: &Scope) -> Option<Vec<Value>> {
        let feeds = self.feeds.lock().expect("subscription registry lock");
        feeds.get(&(kind, scope.clone()))?.view.clone()
    }

    /// Mutate the cached view in place and notify listeners.
    ///
    /// Reserved for the mutation coordinator's apply/rollback; returns false
    /// when no view is cached for the scope (nothing to mutate).
    pub(crate) fn apply_local(
        &self,
        kind: EntityKind,
        scope: &Scope,
        mutate: impl FnOnce(&mut Vec<Value>),
    ) -> bool {
        let (docs, callbacks): (Vec<Value>, Vec<ChangeCallback>) = {
            let mut feeds = self.feeds.lock().expect("subscription registry lock");
            let Some(feed) = feeds.get_mut(&(kind, scope.clone())) else {
                return false;
            };
            let Some(view) = feed.view.as_mut() else {
                return false;
            };
            mutate(view);
            (
                view.clone(),
                feed.listeners
                    .values()
                    .map(|listener| Arc::clone(&listener.on_change))
                    .collect(),
            )
        };
        for callback in callbacks {
            callback(&docs);
        }
        true
    }
}

/// Live listener registration; unsubscribes on drop.
pub struct Subscription {
    manager: Weak<SubscriptionManager>,
    kind: EntityKind,
    scope: Scope,
    listener_id: u64,
    released: bool,
}

impl Subscription {
    /// Explicitly release the listener.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Some(manager) = self.manager.upgrade() {
            manager.unsubscribe(self.kind, &self.scope, self.listener_id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}
