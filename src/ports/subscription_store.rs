//! Subscription store port.

use async_trait::async_trait;

use crate::domain::billing::UserSubscription;
use crate::domain::foundation::{DomainError, UserId};

/// Persistence port for the per-user subscription record.
///
/// The store holds at most one record per user. `replace` is the only write:
/// reconciliation always persists a full snapshot-derived record, never a
/// field-level patch, which is what keeps webhook handling idempotent and
/// order-tolerant.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Read the user's current subscription record.
    async fn find_by_user_id(
        &self,
        user_id: &UserId,
    ) -> Result<Option<UserSubscription>, DomainError>;

    /// Insert or fully overwrite the record keyed by `subscription.user_id`.
    async fn replace(&self, subscription: &UserSubscription) -> Result<(), DomainError>;
}
