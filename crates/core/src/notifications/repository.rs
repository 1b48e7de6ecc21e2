//! Typed accessors for the notification collection.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use crate::context::UserContext;
use crate::errors::Result;
use crate::notifications::{NewNotification, Notification};
use crate::store::{EntityKind, RemoteStore, Scope, ScopeFilter};

pub struct NotificationRepository {
    store: Arc<dyn RemoteStore>,
}

impl NotificationRepository {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, ctx: &UserContext) -> Result<Vec<Notification>> {
        let docs = self
            .store
            .list(EntityKind::Notification, &Scope::owned(ctx.user_id()))
            .await?;
        docs.into_iter()
            .map(|doc| Ok(serde_json::from_value(doc)?))
            .collect()
    }

    pub async fn list_unread(&self, ctx: &UserContext) -> Result<Vec<Notification>> {
        let docs = self
            .store
            .list(
                EntityKind::Notification,
                &Scope::filtered(ctx.user_id(), ScopeFilter::UnreadOnly),
            )
            .await?;
        docs.into_iter()
            .map(|doc| Ok(serde_json::from_value(doc)?))
            .collect()
    }

    pub async fn create(&self, ctx: &UserContext, new: NewNotification) -> Result<String> {
        let mut doc = serde_json::to_value(&new)?;
        if let Some(object) = doc.as_object_mut() {
            object.insert("read".to_string(), json!(false));
            object.insert("createdAt".to_string(), serde_json::to_value(Utc::now())?);
        }
        self.store
            .create(EntityKind::Notification, ctx.user_id(), doc)
            .await
    }

    pub async fn mark_read(&self, ctx: &UserContext, id: &str) -> Result<()> {
        self.store
            .update(
                EntityKind::Notification,
                ctx.user_id(),
                id,
                json!({ "read": true }),
            )
            .await
    }

    pub async fn delete(&self, ctx: &UserContext, id: &str) -> Result<()> {
        self.store
            .delete(EntityKind::Notification, ctx.user_id(), id)
            .await
    }
}
