//! UserSubscription aggregate.
//!
//! The single record answering "what plan is this user on". One record per
//! user, keyed by user id. The record is never deleted: provider-side
//! cancellation reverts it to the free-plan shape instead of removing it.
//!
//! # Design Decisions
//!
//! - **Snapshot replacement**: webhook reconciliation overwrites every field
//!   from the provider's full current state. No partial merges, so repeated
//!   or out-of-order deliveries converge on the last delivered snapshot.
//! - **Created out-of-band**: a provisioning step outside this service writes
//!   the first (free) record at signup; this service only replaces it.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PlanId, Timestamp, UserId};

use super::event::SubscriptionSnapshot;
use super::plan::BillingInterval;

/// Provider-reported lifecycle status of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    PastDue,
    Canceled,
    Trialing,
    Incomplete,
    IncompleteExpired,
    Unpaid,
}

impl SubscriptionStatus {
    /// Parses the provider's status string.
    ///
    /// Returns `None` for statuses outside the closed set so callers can
    /// fail safe instead of persisting a value they cannot interpret.
    pub fn from_provider(status: &str) -> Option<Self> {
        match status {
            "active" => Some(SubscriptionStatus::Active),
            "past_due" => Some(SubscriptionStatus::PastDue),
            "canceled" => Some(SubscriptionStatus::Canceled),
            "trialing" => Some(SubscriptionStatus::Trialing),
            "incomplete" => Some(SubscriptionStatus::Incomplete),
            "incomplete_expired" => Some(SubscriptionStatus::IncompleteExpired),
            "unpaid" => Some(SubscriptionStatus::Unpaid),
            _ => None,
        }
    }

    /// Returns the provider-side status string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::Incomplete => "incomplete",
            SubscriptionStatus::IncompleteExpired => "incomplete_expired",
            SubscriptionStatus::Unpaid => "unpaid",
        }
    }

    /// Check if this status grants access to paid features.
    pub fn has_access(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Active | SubscriptionStatus::Trialing | SubscriptionStatus::PastDue
        )
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user's subscription record.
///
/// # Invariants
///
/// - `user_id` is the sole key: at most one record per user
/// - `plan_id` resolves to an active catalog plan
/// - `stripe_customer_id` agrees with the profile's once both are set
/// - `current_period_end == None` means the record never expires (free plan)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSubscription {
    /// Owning user (sole key).
    pub user_id: UserId,

    /// Catalog plan the user is on.
    pub plan_id: PlanId,

    /// Provider subscription reference (None for the free tier).
    pub stripe_subscription_id: Option<String>,

    /// Provider customer reference.
    pub stripe_customer_id: Option<String>,

    /// Lifecycle status.
    pub status: SubscriptionStatus,

    /// Start of the current billing period.
    pub current_period_start: Option<Timestamp>,

    /// End of the current billing period (None = never expires).
    pub current_period_end: Option<Timestamp>,

    /// Whether the provider will cancel at period end.
    pub cancel_at_period_end: bool,

    /// Billing cadence (None for the free tier).
    pub billing_interval: Option<BillingInterval>,

    /// Trial start, if the subscription is or was trialing.
    pub trial_start: Option<Timestamp>,

    /// Trial end, if the subscription is or was trialing.
    pub trial_end: Option<Timestamp>,
}

impl UserSubscription {
    /// The free-plan shape a subscription reverts to when the provider
    /// deletes the paid subscription.
    pub fn free(user_id: UserId, stripe_customer_id: Option<String>) -> Self {
        Self {
            user_id,
            plan_id: PlanId::free(),
            stripe_subscription_id: None,
            stripe_customer_id,
            status: SubscriptionStatus::Active,
            current_period_start: Some(Timestamp::now()),
            current_period_end: None,
            cancel_at_period_end: false,
            billing_interval: None,
            trial_start: None,
            trial_end: None,
        }
    }

    /// Builds the full replacement record from a provider snapshot.
    ///
    /// Every reconciled field is taken from the snapshot; nothing from any
    /// previous record survives.
    pub fn from_snapshot(
        user_id: UserId,
        plan_id: PlanId,
        status: SubscriptionStatus,
        interval: BillingInterval,
        snapshot: &SubscriptionSnapshot,
    ) -> Self {
        Self {
            user_id,
            plan_id,
            stripe_subscription_id: Some(snapshot.id.clone()),
            stripe_customer_id: snapshot.customer.clone(),
            status,
            current_period_start: snapshot.current_period_start.map(Timestamp::from_unix_secs),
            current_period_end: snapshot.current_period_end.map(Timestamp::from_unix_secs),
            cancel_at_period_end: snapshot.cancel_at_period_end,
            billing_interval: Some(interval),
            trial_start: snapshot.trial_start.map(Timestamp::from_unix_secs),
            trial_end: snapshot.trial_end.map(Timestamp::from_unix_secs),
        }
    }

    /// Whether the subscription currently grants paid-tier access.
    pub fn has_access(&self) -> bool {
        self.status.has_access()
    }

    /// Whether this record is on a paid plan backed by a provider subscription.
    pub fn is_paid(&self) -> bool {
        !self.plan_id.is_free() && self.stripe_subscription_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user_id() -> UserId {
        UserId::new("usr_1").unwrap()
    }

    fn pro_snapshot() -> SubscriptionSnapshot {
        serde_json::from_value(serde_json::json!({
            "id": "sub_456",
            "customer": "cus_123",
            "status": "active",
            "current_period_start": 1704067200,
            "current_period_end": 1706745600,
            "cancel_at_period_end": false,
            "items": {
                "data": [{
                    "price": {
                        "id": "price_pro_month",
                        "product": "prod_pro",
                        "recurring": {"interval": "month"}
                    }
                }]
            }
        }))
        .unwrap()
    }

    #[test]
    fn status_parses_full_closed_set() {
        for s in [
            "active",
            "past_due",
            "canceled",
            "trialing",
            "incomplete",
            "incomplete_expired",
            "unpaid",
        ] {
            let parsed = SubscriptionStatus::from_provider(s).unwrap();
            assert_eq!(parsed.as_str(), s);
        }
    }

    #[test]
    fn status_rejects_unknown_values() {
        assert!(SubscriptionStatus::from_provider("paused").is_none());
        assert!(SubscriptionStatus::from_provider("").is_none());
    }

    #[test]
    fn access_granted_for_active_trialing_past_due() {
        assert!(SubscriptionStatus::Active.has_access());
        assert!(SubscriptionStatus::Trialing.has_access());
        assert!(SubscriptionStatus::PastDue.has_access());

        assert!(!SubscriptionStatus::Canceled.has_access());
        assert!(!SubscriptionStatus::Incomplete.has_access());
        assert!(!SubscriptionStatus::Unpaid.has_access());
    }

    #[test]
    fn free_shape_matches_revert_contract() {
        let sub = UserSubscription::free(test_user_id(), Some("cus_123".to_string()));

        assert!(sub.plan_id.is_free());
        assert!(sub.stripe_subscription_id.is_none());
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert!(sub.current_period_start.is_some());
        assert!(sub.current_period_end.is_none());
        assert!(!sub.cancel_at_period_end);
        assert!(sub.billing_interval.is_none());
        assert!(sub.trial_start.is_none());
        assert!(sub.trial_end.is_none());
    }

    #[test]
    fn from_snapshot_copies_every_field() {
        let snapshot = pro_snapshot();
        let sub = UserSubscription::from_snapshot(
            test_user_id(),
            PlanId::new("pro").unwrap(),
            SubscriptionStatus::Active,
            BillingInterval::Month,
            &snapshot,
        );

        assert_eq!(sub.stripe_subscription_id.as_deref(), Some("sub_456"));
        assert_eq!(sub.stripe_customer_id.as_deref(), Some("cus_123"));
        assert_eq!(
            sub.current_period_start.unwrap().as_unix_secs(),
            1704067200
        );
        assert_eq!(sub.current_period_end.unwrap().as_unix_secs(), 1706745600);
        assert!(!sub.cancel_at_period_end);
        assert_eq!(sub.billing_interval, Some(BillingInterval::Month));
        assert!(sub.is_paid());
    }

    #[test]
    fn free_record_is_not_paid() {
        let sub = UserSubscription::free(test_user_id(), None);
        assert!(!sub.is_paid());
        assert!(sub.has_access());
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&SubscriptionStatus::IncompleteExpired).unwrap(),
            "\"incomplete_expired\""
        );
        assert_eq!(
            serde_json::to_string(&SubscriptionStatus::PastDue).unwrap(),
            "\"past_due\""
        );
    }
}
