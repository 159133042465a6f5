//! Subscription sync engine.
//!
//! Applies provider subscription snapshots to the local per-user record.
//! Reconciliation is snapshot replacement: the provider sends the
//! subscription's full current state on every event, so the engine always
//! overwrites the whole record instead of merging fields. Repeated delivery
//! of the same event is a no-op and late delivery of an older event simply
//! converges on the last delivered state.

use std::sync::Arc;

use crate::domain::billing::{
    BillingError, BillingInterval, PriceSnapshot, SubscriptionSnapshot, SubscriptionStatus,
    UserProfile, UserSubscription,
};
use crate::domain::foundation::UserId;
use crate::ports::{PlanCatalog, ProfileRepository, SubscriptionStore};

use super::resolvers::{IdentityResolver, PlanResolver};

/// What the engine did with a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The record was replaced with the snapshot-derived state.
    Applied { user_id: UserId },

    /// The record was reverted to the free-plan shape.
    RevertedToFree { user_id: UserId },

    /// Customer reference matched no profile; nothing was mutated.
    SkippedUnknownCustomer { customer_ref: String },

    /// Price reference matched no catalog plan; nothing was mutated.
    SkippedUnknownPlan { price_ref: String },

    /// The snapshot was missing a field the engine cannot proceed without.
    SkippedInvalidSnapshot { reason: String },
}

/// Applies provider subscription state to the local store.
pub struct SyncSubscriptionHandler {
    identity: IdentityResolver,
    plans: PlanResolver,
    profiles: Arc<dyn ProfileRepository>,
    subscriptions: Arc<dyn SubscriptionStore>,
}

impl SyncSubscriptionHandler {
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        catalog: Arc<dyn PlanCatalog>,
        subscriptions: Arc<dyn SubscriptionStore>,
    ) -> Self {
        Self {
            identity: IdentityResolver::new(profiles.clone()),
            plans: PlanResolver::new(catalog),
            profiles,
            subscriptions,
        }
    }

    /// Replace the user's record with the snapshot's full state.
    ///
    /// Aborts without mutation when the customer or price cannot be
    /// resolved, or when the snapshot is structurally unusable. The profile
    /// mirror write afterwards is best-effort and never rolls back the
    /// primary upsert.
    pub async fn apply_snapshot(
        &self,
        snapshot: &SubscriptionSnapshot,
    ) -> Result<SyncOutcome, BillingError> {
        let Some(customer_ref) = snapshot.customer.as_deref() else {
            return Ok(SyncOutcome::SkippedInvalidSnapshot {
                reason: "snapshot has no customer reference".to_string(),
            });
        };

        let Some(user_id) = self.identity.resolve_customer(customer_ref).await? else {
            tracing::info!(
                customer_ref,
                subscription_id = %snapshot.id,
                "No profile for customer, skipping subscription sync"
            );
            return Ok(SyncOutcome::SkippedUnknownCustomer {
                customer_ref: customer_ref.to_string(),
            });
        };

        let Some(price) = snapshot.primary_price() else {
            return Ok(SyncOutcome::SkippedInvalidSnapshot {
                reason: "snapshot has no price on its first item".to_string(),
            });
        };

        let Some(plan) = self.plans.resolve_price(&price.id).await? else {
            tracing::warn!(
                price_ref = %price.id,
                user_id = %user_id,
                "No plan matches price, leaving previous subscription state intact"
            );
            return Ok(SyncOutcome::SkippedUnknownPlan {
                price_ref: price.id.clone(),
            });
        };

        let Some(status) = SubscriptionStatus::from_provider(&snapshot.status) else {
            return Ok(SyncOutcome::SkippedInvalidSnapshot {
                reason: format!("unrecognized subscription status '{}'", snapshot.status),
            });
        };

        let interval = BillingInterval::from_provider(price.recurring_interval());
        let record = UserSubscription::from_snapshot(
            user_id.clone(),
            plan.plan_id.clone(),
            status,
            interval,
            snapshot,
        );

        self.subscriptions.replace(&record).await?;

        tracing::info!(
            user_id = %user_id,
            plan_id = %plan.plan_id,
            status = %status,
            subscription_id = %snapshot.id,
            "Subscription record replaced from provider snapshot"
        );

        self.mirror_profile(&user_id, customer_ref, Some(price)).await;

        Ok(SyncOutcome::Applied { user_id })
    }

    /// Revert the user's record to the free-plan shape.
    ///
    /// Used for `customer.subscription.deleted`: the record is never removed,
    /// it becomes a free-tier record with no provider subscription attached.
    pub async fn revert_to_free(
        &self,
        snapshot: &SubscriptionSnapshot,
    ) -> Result<SyncOutcome, BillingError> {
        let Some(customer_ref) = snapshot.customer.as_deref() else {
            return Ok(SyncOutcome::SkippedInvalidSnapshot {
                reason: "snapshot has no customer reference".to_string(),
            });
        };

        let Some(user_id) = self.identity.resolve_customer(customer_ref).await? else {
            tracing::info!(
                customer_ref,
                subscription_id = %snapshot.id,
                "No profile for customer, skipping revert to free"
            );
            return Ok(SyncOutcome::SkippedUnknownCustomer {
                customer_ref: customer_ref.to_string(),
            });
        };

        let record = UserSubscription::free(user_id.clone(), Some(customer_ref.to_string()));
        self.subscriptions.replace(&record).await?;

        tracing::info!(
            user_id = %user_id,
            subscription_id = %snapshot.id,
            "Subscription deleted by provider, record reverted to free plan"
        );

        self.mirror_profile(&user_id, customer_ref, snapshot.primary_price())
            .await;

        Ok(SyncOutcome::RevertedToFree { user_id })
    }

    /// Best-effort mirror of provider state onto the profile for display.
    ///
    /// Fire-and-forget with its own error channel: failures are logged and
    /// never propagate into the primary upsert's result.
    async fn mirror_profile(
        &self,
        user_id: &UserId,
        customer_ref: &str,
        price: Option<&PriceSnapshot>,
    ) {
        let result = self.write_profile_mirror(user_id, customer_ref, price).await;
        if let Err(err) = result {
            tracing::warn!(
                user_id = %user_id,
                error = %err,
                "Profile mirror update failed (subscription record already saved)"
            );
        }
    }

    async fn write_profile_mirror(
        &self,
        user_id: &UserId,
        customer_ref: &str,
        price: Option<&PriceSnapshot>,
    ) -> Result<(), crate::domain::foundation::DomainError> {
        let mut profile = match self.profiles.find_by_user_id(user_id).await? {
            Some(profile) => profile,
            None => UserProfile::new(user_id.clone(), None),
        };

        profile.attach_customer(customer_ref);
        profile.record_latest_pricing(
            price.map(|p| p.id.clone()),
            price.and_then(|p| p.product.clone()),
        );

        self.profiles.upsert(&profile).await
    }
}
