//! Notification service.
//!
//! Single-record operations (mark one read, dismiss one) are optimistic and
//! take the caller's subscription scope so the visible view updates
//! immediately. Bulk operations confirm each record remotely before moving
//! on; their progress reaches views through authoritative snapshots.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use serde_json::json;

use crate::context::UserContext;
use crate::errors::Result;
use crate::notifications::{NewNotification, Notification, NotificationRepository};
use crate::store::{EntityKind, Scope};
use crate::sync::MutationCoordinator;

#[async_trait]
pub trait NotificationServiceTrait: Send + Sync {
    async fn list(&self, ctx: &UserContext) -> Result<Vec<Notification>>;

    async fn create(&self, ctx: &UserContext, new: NewNotification) -> Result<String>;

    /// Optimistically mark one notification read within the given scope.
    async fn mark_read(&self, ctx: &UserContext, scope: &Scope, id: &str) -> Result<()>;

    /// Optimistically dismiss one notification within the given scope.
    async fn dismiss(&self, ctx: &UserContext, scope: &Scope, id: &str) -> Result<()>;

    /// Mark every unread notification read, one confirmed write at a time.
    /// Returns the number updated; stops at the first remote failure.
    async fn mark_all_read(&self, ctx: &UserContext) -> Result<usize>;

    /// Delete every notification, one confirmed write at a time. Returns the
    /// number deleted; stops at the first remote failure.
    async fn clear_all(&self, ctx: &UserContext) -> Result<usize>;
}

pub struct NotificationService {
    repository: Arc<NotificationRepository>,
    coordinator: Arc<MutationCoordinator>,
}

impl NotificationService {
    pub fn new(
        repository: Arc<NotificationRepository>,
        coordinator: Arc<MutationCoordinator>,
    ) -> Self {
        Self {
            repository,
            coordinator,
        }
    }
}

#[async_trait]
impl NotificationServiceTrait for NotificationService {
    async fn list(&self, ctx: &UserContext) -> Result<Vec<Notification>> {
        self.repository.list(ctx).await
    }

    async fn create(&self, ctx: &UserContext, new: NewNotification) -> Result<String> {
        self.repository.create(ctx, new).await
    }

    async fn mark_read(&self, ctx: &UserContext, scope: &Scope, id: &str) -> Result<()> {
        self.coordinator
            .apply_one(
                EntityKind::Notification,
                scope,
                id,
                |doc| {
                    let mut next = doc.clone();
                    next["read"] = json!(true);
                    next
                },
                self.repository.mark_read(ctx, id),
            )
            .await
    }

    async fn dismiss(&self, ctx: &UserContext, scope: &Scope, id: &str) -> Result<()> {
        self.coordinator
            .apply_removal(
                EntityKind::Notification,
                scope,
                id,
                self.repository.delete(ctx, id),
            )
            .await
    }

    async fn mark_all_read(&self, ctx: &UserContext) -> Result<usize> {
        let unread = self.repository.list_unread(ctx).await?;
        let mut updated = 0;
        for notification in &unread {
            self.repository.mark_read(ctx, &notification.id).await?;
            updated += 1;
        }
        debug!("marked {} notifications read", updated);
        Ok(updated)
    }

    async fn clear_all(&self, ctx: &UserContext) -> Result<usize> {
        let all = self.repository.list(ctx).await?;
        let mut deleted = 0;
        for notification in &all {
            self.repository.delete(ctx, &notification.id).await?;
            deleted += 1;
        }
        debug!("cleared {} notifications", deleted);
        Ok(deleted)
    }
}
