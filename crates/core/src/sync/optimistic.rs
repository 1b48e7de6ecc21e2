//! Optimistic mutation coordinator.
//!
//! A mutation applies its local transform to the cached view synchronously,
//! then awaits the remote write. Success needs no further action: the next
//! authoritative snapshot supersedes the optimistic value. Failure restores
//! the pre-mutation state before the error is re-raised, so callers never
//! observe an error alongside a dangling optimistic value.
//!
//! Only single-record mutations go through this path. Multi-entity
//! operations (fold-back, mark-all, clear-all) await remote confirmation per
//! sub-operation instead, because partial visible success with silent partial
//! failure is worse than a slower update.

use std::future::Future;
use std::sync::Arc;

use log::{debug, warn};
use serde_json::Value;

use crate::errors::{Error, Result};
use crate::store::{doc_id, EntityKind, Scope};
use crate::sync::SubscriptionManager;

/// Lifecycle of one optimistic mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPhase {
    /// Local transform applied, remote write in flight.
    Applying,
    /// Remote write succeeded; the next snapshot is authoritative.
    Confirmed,
    /// Remote write failed; the pre-mutation state was restored.
    RolledBack,
}

/// State machine for a single mutation. Transitions are one-way: a mutation
/// leaves `Applying` exactly once.
#[derive(Debug)]
pub struct Mutation {
    phase: MutationPhase,
}

impl Mutation {
    pub fn new() -> Self {
        Self {
            phase: MutationPhase::Applying,
        }
    }

    pub fn phase(&self) -> MutationPhase {
        self.phase
    }

    pub fn confirm(&mut self) {
        debug_assert_eq!(self.phase, MutationPhase::Applying);
        self.phase = MutationPhase::Confirmed;
    }

    pub fn roll_back(&mut self) {
        debug_assert_eq!(self.phase, MutationPhase::Applying);
        self.phase = MutationPhase::RolledBack;
    }
}

impl Default for Mutation {
    fn default() -> Self {
        Self::new()
    }
}

fn replace_doc(docs: &mut Vec<Value>, id: &str, replacement: Value) {
    match docs.iter().position(|doc| doc_id(doc) == Some(id)) {
        Some(index) => docs[index] = replacement,
        None => docs.push(replacement),
    }
}

pub struct MutationCoordinator {
    subscriptions: Arc<SubscriptionManager>,
}

impl MutationCoordinator {
    pub fn new(subscriptions: Arc<SubscriptionManager>) -> Self {
        Self { subscriptions }
    }

    /// Optimistically replace one record in the cached view.
    ///
    /// `transform` is a pure old-to-new function over the cached document.
    /// The remote call is not cancelable once issued; its outcome is
    /// processed even if every view of the scope has since been dropped, so
    /// the cache stays correct for other listeners.
    pub async fn apply_one<F, Fut>(
        &self,
        kind: EntityKind,
        scope: &Scope,
        id: &str,
        transform: F,
        remote_call: Fut,
    ) -> Result<()>
    where
        F: FnOnce(&Value) -> Value,
        Fut: Future<Output = Result<()>>,
    {
        let pre_image = self
            .subscriptions
            .cached_doc(kind, scope, id)
            .ok_or_else(|| Error::not_found(kind, id))?;
        let next = transform(&pre_image);

        let mut mutation = Mutation::new();
        self.subscriptions
            .apply_local(kind, scope, |docs| replace_doc(docs, id, next));

        match remote_call.await {
            Ok(()) => {
                mutation.confirm();
                Ok(())
            }
            Err(err) => {
                warn!("optimistic update of {} '{}' failed, rolling back: {}", kind, id, err);
                self.subscriptions
                    .apply_local(kind, scope, |docs| replace_doc(docs, id, pre_image));
                mutation.roll_back();
                Err(err)
            }
        }
    }

    /// Optimistically remove one record from the cached view.
    ///
    /// Rollback reinserts the record at its original position. A snapshot
    /// that raced the failing delete may already carry the record again;
    /// in that case rollback replaces it in place instead of duplicating it.
    pub async fn apply_removal<Fut>(
        &self,
        kind: EntityKind,
        scope: &Scope,
        id: &str,
        remote_call: Fut,
    ) -> Result<()>
    where
        Fut: Future<Output = Result<()>>,
    {
        let view = self
            .subscriptions
            .cached_view(kind, scope)
            .ok_or_else(|| Error::not_found(kind, id))?;
        let index = view
            .iter()
            .position(|doc| doc_id(doc) == Some(id))
            .ok_or_else(|| Error::not_found(kind, id))?;
        let pre_image = view[index].clone();

        let mut mutation = Mutation::new();
        self.subscriptions.apply_local(kind, scope, |docs| {
            docs.retain(|doc| doc_id(doc) != Some(id));
        });

        match remote_call.await {
            Ok(()) => {
                mutation.confirm();
                Ok(())
            }
            Err(err) => {
                warn!("optimistic removal of {} '{}' failed, rolling back: {}", kind, id, err);
                self.subscriptions.apply_local(kind, scope, |docs| {
                    match docs.iter().position(|doc| doc_id(doc) == Some(id)) {
                        Some(present) => docs[present] = pre_image,
                        None => {
                            let at = index.min(docs.len());
                            docs.insert(at, pre_image);
                        }
                    }
                });
                mutation.roll_back();
                Err(err)
            }
        }
    }

    /// Optimistically patch a per-user singleton record.
    ///
    /// Rollback re-fetches the authoritative record instead of diffing
    /// against a pre-image: repeated partial toggles make diffing
    /// error-prone, and one extra round trip buys correctness. The captured
    /// pre-image is only used when the refetch itself fails, so no error path
    /// leaves the optimistic value in place.
    pub async fn apply_singleton<F, Fut, R>(
        &self,
        kind: EntityKind,
        scope: &Scope,
        transform: F,
        remote_call: Fut,
        refetch: R,
    ) -> Result<()>
    where
        F: FnOnce(&Value) -> Value,
        Fut: Future<Output = Result<()>>,
        R: Future<Output = Result<Value>>,
    {
        let pre_image = self
            .subscriptions
            .cached_singleton(kind, scope)
            .ok_or_else(|| Error::not_found(kind, scope.owner_id.clone()))?;
        let next = transform(&pre_image);

        let mut mutation = Mutation::new();
        self.subscriptions
            .apply_local(kind, scope, |docs| *docs = vec![next]);

        match remote_call.await {
            Ok(()) => {
                mutation.confirm();
                Ok(())
            }
            Err(err) => {
                match refetch.await {
                    Ok(authoritative) => {
                        debug!("singleton {} rollback via refetch", kind);
                        self.subscriptions
                            .apply_local(kind, scope, |docs| *docs = vec![authoritative]);
                    }
                    Err(refetch_err) => {
                        warn!(
                            "singleton {} refetch failed ({}), restoring pre-image",
                            kind, refetch_err
                        );
                        self.subscriptions
                            .apply_local(kind, scope, |docs| *docs = vec![pre_image]);
                    }
                }
                mutation.roll_back();
                Err(err)
            }
        }
    }
}
