//! Typed accessors for the profile and preference singletons.

use std::sync::Arc;

use serde_json::Value;

use crate::context::UserContext;
use crate::errors::Result;
use crate::profiles::{NotificationPreferences, UserProfile};
use crate::store::{EntityKind, RemoteStore};

pub struct ProfileRepository {
    store: Arc<dyn RemoteStore>,
}

impl ProfileRepository {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    /// The user's profile, or the defaults when none was ever written.
    pub async fn get_profile(&self, ctx: &UserContext) -> Result<UserProfile> {
        match self
            .store
            .get(EntityKind::UserProfile, ctx.user_id(), ctx.user_id())
            .await
        {
            Ok(doc) => Ok(serde_json::from_value(doc)?),
            Err(err) if err.is_not_found() => Ok(UserProfile::default()),
            Err(err) => Err(err),
        }
    }

    pub async fn upsert_profile(&self, ctx: &UserContext, profile: &UserProfile) -> Result<()> {
        let doc = singleton_doc(ctx, serde_json::to_value(profile)?);
        self.store
            .upsert_singleton(EntityKind::UserProfile, ctx.user_id(), doc)
            .await
    }

    /// The user's notification preferences, or the defaults when none was
    /// ever written.
    pub async fn get_preferences(&self, ctx: &UserContext) -> Result<NotificationPreferences> {
        match self
            .store
            .get(
                EntityKind::NotificationPreferences,
                ctx.user_id(),
                ctx.user_id(),
            )
            .await
        {
            Ok(doc) => Ok(serde_json::from_value(doc)?),
            Err(err) if err.is_not_found() => Ok(NotificationPreferences::default()),
            Err(err) => Err(err),
        }
    }

    pub async fn upsert_preferences(
        &self,
        ctx: &UserContext,
        prefs: &NotificationPreferences,
    ) -> Result<()> {
        let doc = singleton_doc(ctx, serde_json::to_value(prefs)?);
        self.store
            .upsert_singleton(EntityKind::NotificationPreferences, ctx.user_id(), doc)
            .await
    }

    /// Authoritative re-read used for singleton rollback.
    pub async fn refetch_preferences(&self, ctx: &UserContext) -> Result<Value> {
        self.store
            .get(
                EntityKind::NotificationPreferences,
                ctx.user_id(),
                ctx.user_id(),
            )
            .await
    }
}

/// Singleton documents carry their owner's id as the document id.
fn singleton_doc(ctx: &UserContext, mut doc: Value) -> Value {
    if let Some(object) = doc.as_object_mut() {
        object.insert("id".to_string(), Value::String(ctx.user_id().to_string()));
    }
    doc
}
