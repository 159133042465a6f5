//! Subscription status query.

use std::sync::Arc;

use crate::domain::billing::{BillingError, UserSubscription};
use crate::domain::foundation::UserId;
use crate::ports::SubscriptionStore;

/// Query for the authenticated user's subscription record.
#[derive(Debug, Clone)]
pub struct GetSubscriptionQuery {
    pub user_id: UserId,
}

/// Reads back the per-user subscription record.
pub struct GetSubscriptionHandler {
    subscriptions: Arc<dyn SubscriptionStore>,
}

impl GetSubscriptionHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionStore>) -> Self {
        Self { subscriptions }
    }

    /// Returns `None` when the provisioning step has not written the user's
    /// first record yet.
    pub async fn handle(
        &self,
        query: GetSubscriptionQuery,
    ) -> Result<Option<UserSubscription>, BillingError> {
        Ok(self.subscriptions.find_by_user_id(&query.user_id).await?)
    }
}
