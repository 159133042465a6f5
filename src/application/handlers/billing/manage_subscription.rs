//! Direct cancel/resume of the user's provider subscription.
//!
//! These calls never patch local state themselves: they delegate to the
//! provider and feed its response snapshot back through the sync engine, so
//! the local record is always re-derived from provider truth.

use std::sync::Arc;

use crate::domain::billing::{BillingError, UserSubscription};
use crate::domain::foundation::UserId;
use crate::ports::{PaymentProvider, SubscriptionStore};

use super::sync_subscription::SyncSubscriptionHandler;

/// Command to toggle cancel-at-period-end.
#[derive(Debug, Clone)]
pub struct UpdateCancellationCommand {
    pub user_id: UserId,
    /// true = cancel at period end, false = resume.
    pub cancel_at_period_end: bool,
}

/// Handler for user-initiated cancel/resume.
pub struct UpdateCancellationHandler {
    subscriptions: Arc<dyn SubscriptionStore>,
    payment_provider: Arc<dyn PaymentProvider>,
    sync: Arc<SyncSubscriptionHandler>,
}

impl UpdateCancellationHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionStore>,
        payment_provider: Arc<dyn PaymentProvider>,
        sync: Arc<SyncSubscriptionHandler>,
    ) -> Self {
        Self {
            subscriptions,
            payment_provider,
            sync,
        }
    }

    pub async fn handle(
        &self,
        cmd: UpdateCancellationCommand,
    ) -> Result<UserSubscription, BillingError> {
        let record = self
            .subscriptions
            .find_by_user_id(&cmd.user_id)
            .await?
            .ok_or_else(|| BillingError::subscription_not_found(cmd.user_id.clone()))?;

        let Some(subscription_id) = record.stripe_subscription_id.as_deref() else {
            return Err(BillingError::subscription_not_found(cmd.user_id.clone()));
        };

        let snapshot = self
            .payment_provider
            .set_cancel_at_period_end(subscription_id, cmd.cancel_at_period_end)
            .await?;

        self.sync.apply_snapshot(&snapshot).await?;

        tracing::info!(
            user_id = %cmd.user_id,
            subscription_id,
            cancel_at_period_end = cmd.cancel_at_period_end,
            "Subscription cancellation flag updated via provider"
        );

        self.subscriptions
            .find_by_user_id(&cmd.user_id)
            .await?
            .ok_or_else(|| BillingError::subscription_not_found(cmd.user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryPlanCatalog, InMemoryProfileRepository, InMemorySubscriptionStore,
    };
    use crate::adapters::stripe::MockPaymentProvider;
    use crate::domain::billing::{SubscriptionPlan, UserProfile};
    use crate::domain::foundation::PlanId;
    use crate::ports::ProfileRepository;
    use serde_json::json;

    fn pro_plan() -> SubscriptionPlan {
        SubscriptionPlan {
            plan_id: PlanId::new("pro").unwrap(),
            name: "Pro".to_string(),
            monthly_price: 1900,
            yearly_price: 19000,
            currency: "usd".to_string(),
            stripe_monthly_price_id: Some("price_pro_month".to_string()),
            stripe_yearly_price_id: Some("price_pro_year".to_string()),
            stripe_product_id: Some("prod_pro".to_string()),
            is_active: true,
        }
    }

    struct Fixture {
        subscriptions: Arc<InMemorySubscriptionStore>,
        provider: Arc<MockPaymentProvider>,
        handler: UpdateCancellationHandler,
    }

    async fn fixture() -> Fixture {
        let profiles = Arc::new(InMemoryProfileRepository::new());
        let mut profile = UserProfile::new(UserId::new("u1").unwrap(), None);
        profile.attach_customer("cus_123");
        profiles.upsert(&profile).await.unwrap();

        let catalog = Arc::new(InMemoryPlanCatalog::with_plans(vec![pro_plan()]));
        let subscriptions = Arc::new(InMemorySubscriptionStore::new());
        let provider = Arc::new(MockPaymentProvider::new());

        let sync = Arc::new(SyncSubscriptionHandler::new(
            profiles,
            catalog,
            subscriptions.clone(),
        ));
        let handler =
            UpdateCancellationHandler::new(subscriptions.clone(), provider.clone(), sync);

        Fixture {
            subscriptions,
            provider,
            handler,
        }
    }

    fn paid_record(cancel_at_period_end: bool) -> UserSubscription {
        serde_json::from_value(json!({
            "user_id": "u1",
            "plan_id": "pro",
            "stripe_subscription_id": "sub_456",
            "stripe_customer_id": "cus_123",
            "status": "active",
            "current_period_start": "2024-01-01T00:00:00Z",
            "current_period_end": "2024-02-01T00:00:00Z",
            "cancel_at_period_end": cancel_at_period_end,
            "billing_interval": "month",
            "trial_start": null,
            "trial_end": null
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn cancel_delegates_to_provider_and_rederives_state() {
        let fx = fixture().await;
        fx.subscriptions.replace(&paid_record(false)).await.unwrap();
        fx.provider.set_cancellation_response(
            "sub_456",
            "cus_123",
            "price_pro_month",
            true,
        );

        let updated = fx
            .handler
            .handle(UpdateCancellationCommand {
                user_id: UserId::new("u1").unwrap(),
                cancel_at_period_end: true,
            })
            .await
            .unwrap();

        assert!(updated.cancel_at_period_end);
        assert_eq!(fx.provider.calls("set_cancel_at_period_end"), 1);

        // Local store now reflects the provider's response snapshot.
        let record = fx
            .subscriptions
            .find_by_user_id(&UserId::new("u1").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(record.cancel_at_period_end);
    }

    #[tokio::test]
    async fn resume_clears_cancellation_flag() {
        let fx = fixture().await;
        fx.subscriptions.replace(&paid_record(true)).await.unwrap();
        fx.provider.set_cancellation_response(
            "sub_456",
            "cus_123",
            "price_pro_month",
            false,
        );

        let updated = fx
            .handler
            .handle(UpdateCancellationCommand {
                user_id: UserId::new("u1").unwrap(),
                cancel_at_period_end: false,
            })
            .await
            .unwrap();

        assert!(!updated.cancel_at_period_end);
    }

    #[tokio::test]
    async fn free_plan_user_cannot_cancel() {
        let fx = fixture().await;
        fx.subscriptions
            .replace(&UserSubscription::free(UserId::new("u1").unwrap(), None))
            .await
            .unwrap();

        let result = fx
            .handler
            .handle(UpdateCancellationCommand {
                user_id: UserId::new("u1").unwrap(),
                cancel_at_period_end: true,
            })
            .await;

        assert!(matches!(result, Err(BillingError::SubscriptionNotFound(_))));
        assert_eq!(fx.provider.calls("set_cancel_at_period_end"), 0);
    }

    #[tokio::test]
    async fn missing_record_is_not_found() {
        let fx = fixture().await;

        let result = fx
            .handler
            .handle(UpdateCancellationCommand {
                user_id: UserId::new("u1").unwrap(),
                cancel_at_period_end: true,
            })
            .await;

        assert!(matches!(result, Err(BillingError::SubscriptionNotFound(_))));
    }
}
