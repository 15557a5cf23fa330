//! Stakeholder profile service
//!
//! Registration and account-to-profile resolution. Credential handling lives
//! outside this service; callers arrive with an already verified account id.

use serde::Deserialize;
use shared::{StakeholderProfile, StakeholderRole};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppResult;
use crate::store::EntityStore;

/// Input for registering a stakeholder profile
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterProfileInput {
    pub user_id: Uuid,
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    pub role: StakeholderRole,
    #[validate(length(max = 255))]
    #[serde(default)]
    pub organization: String,
}

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn EntityStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Create the single profile for an account. Role is fixed from here on.
    pub async fn register(&self, input: RegisterProfileInput) -> AppResult<StakeholderProfile> {
        input.validate()?;

        let mut profile = StakeholderProfile::new(input.username, input.role)
            .with_organization(input.organization);
        profile.user_id = input.user_id;

        let mut tx = self.store.begin().await?;
        tx.insert_profile(&profile).await?;
        tx.commit().await?;

        tracing::info!(
            profile_id = %profile.id,
            user_id = %profile.user_id,
            role = %profile.role,
            "stakeholder profile registered"
        );
        Ok(profile)
    }

    /// Resolve the profile acting on behalf of an authenticated account
    pub async fn resolve_actor(&self, user_id: Uuid) -> AppResult<StakeholderProfile> {
        let mut tx = self.store.begin().await?;
        tx.profile_by_user(user_id).await
    }

    pub async fn get(&self, profile_id: Uuid) -> AppResult<StakeholderProfile> {
        let mut tx = self.store.begin().await?;
        tx.profile(profile_id).await
    }
}
