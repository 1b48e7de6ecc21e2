//! Profile service: singleton reads plus optimistic preference updates.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::context::UserContext;
use crate::errors::Result;
use crate::profiles::{NotificationPreferences, ProfileRepository, UserProfile};
use crate::store::{EntityKind, Scope};
use crate::sync::MutationCoordinator;

#[async_trait]
pub trait ProfileServiceTrait: Send + Sync {
    async fn get_profile(&self, ctx: &UserContext) -> Result<UserProfile>;

    async fn update_profile(&self, ctx: &UserContext, profile: UserProfile) -> Result<()>;

    async fn get_preferences(&self, ctx: &UserContext) -> Result<NotificationPreferences>;

    /// Optimistically replace the preference singleton. On remote failure the
    /// cached record is rolled back by refetching the authoritative one.
    async fn update_preferences(
        &self,
        ctx: &UserContext,
        prefs: NotificationPreferences,
    ) -> Result<()>;
}

pub struct ProfileService {
    repository: Arc<ProfileRepository>,
    coordinator: Arc<MutationCoordinator>,
}

impl ProfileService {
    pub fn new(repository: Arc<ProfileRepository>, coordinator: Arc<MutationCoordinator>) -> Self {
        Self {
            repository,
            coordinator,
        }
    }
}

#[async_trait]
impl ProfileServiceTrait for ProfileService {
    async fn get_profile(&self, ctx: &UserContext) -> Result<UserProfile> {
        self.repository.get_profile(ctx).await
    }

    async fn update_profile(&self, ctx: &UserContext, profile: UserProfile) -> Result<()> {
        self.repository.upsert_profile(ctx, &profile).await
    }

    async fn get_preferences(&self, ctx: &UserContext) -> Result<NotificationPreferences> {
        self.repository.get_preferences(ctx).await
    }

    async fn update_preferences(
        &self,
        ctx: &UserContext,
        prefs: NotificationPreferences,
    ) -> Result<()> {
        let mut next = serde_json::to_value(&prefs)?;
        if let Some(object) = next.as_object_mut() {
            object.insert("id".to_string(), Value::String(ctx.user_id().to_string()));
        }
        self.coordinator
            .apply_singleton(
                EntityKind::NotificationPreferences,
                &Scope::owned(ctx.user_id()),
                |_| next,
                self.repository.upsert_preferences(ctx, &prefs),
                self.repository.refetch_preferences(ctx),
            )
            .await
    }
}
