//! In-memory adapter implementations.
//!
//! Back the repository ports with plain maps. Used as test fixtures and for
//! running the service locally without a database.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::billing::{SubscriptionPlan, UserProfile, UserSubscription};
use crate::domain::foundation::{DomainError, PlanId, UserId};
use crate::ports::{PlanCatalog, ProfileRepository, SubscriptionStore};

/// In-memory profile repository keyed by user id.
#[derive(Default)]
pub struct InMemoryProfileRepository {
    profiles: Mutex<HashMap<UserId, UserProfile>>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Option<UserProfile>, DomainError> {
        Ok(self.profiles.lock().unwrap().get(user_id).cloned())
    }

    async fn find_by_stripe_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<UserProfile>, DomainError> {
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .values()
            .find(|p| p.stripe_customer_id.as_deref() == Some(customer_id))
            .cloned())
    }

    async fn upsert(&self, profile: &UserProfile) -> Result<(), DomainError> {
        self.profiles
            .lock()
            .unwrap()
            .insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }
}

/// In-memory plan catalog seeded at construction.
#[derive(Default)]
pub struct InMemoryPlanCatalog {
    plans: Vec<SubscriptionPlan>,
}

impl InMemoryPlanCatalog {
    pub fn with_plans(plans: Vec<SubscriptionPlan>) -> Self {
        Self { plans }
    }
}

#[async_trait]
impl PlanCatalog for InMemoryPlanCatalog {
    async fn find_by_id(&self, plan_id: &PlanId) -> Result<Option<SubscriptionPlan>, DomainError> {
        Ok(self.plans.iter().find(|p| &p.plan_id == plan_id).cloned())
    }

    async fn find_by_price_id(
        &self,
        price_ref: &str,
    ) -> Result<Option<SubscriptionPlan>, DomainError> {
        Ok(self
            .plans
            .iter()
            .find(|p| p.matches_price(price_ref))
            .cloned())
    }

    async fn list_active(&self) -> Result<Vec<SubscriptionPlan>, DomainError> {
        Ok(self.plans.iter().filter(|p| p.is_active).cloned().collect())
    }
}

/// In-memory subscription store keyed by user id.
#[derive(Default)]
pub struct InMemorySubscriptionStore {
    records: Mutex<HashMap<UserId, UserSubscription>>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn find_by_user_id(
        &self,
        user_id: &UserId,
    ) -> Result<Option<UserSubscription>, DomainError> {
        Ok(self.records.lock().unwrap().get(user_id).cloned())
    }

    async fn replace(&self, subscription: &UserSubscription) -> Result<(), DomainError> {
        self.records
            .lock()
            .unwrap()
            .insert(subscription.user_id.clone(), subscription.clone());
        Ok(())
    }
}
