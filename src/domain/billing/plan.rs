//! Subscription plan catalog types.
//!
//! Plans are seeded externally and read-only to this service. Each paid plan
//! carries one Stripe price per billing cadence plus the owning product.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::PlanId;

/// Billing cadence of a paid subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingInterval {
    Month,
    Year,
}

impl BillingInterval {
    /// Derives the interval from a Stripe price recurring interval.
    ///
    /// Stripe reports `day`, `week`, `month`, or `year`; everything that is
    /// not `year` bills monthly in our catalog.
    pub fn from_provider(interval: &str) -> Self {
        if interval == "year" {
            BillingInterval::Year
        } else {
            BillingInterval::Month
        }
    }

    /// Returns the provider-side interval string.
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingInterval::Month => "month",
            BillingInterval::Year => "year",
        }
    }
}

impl std::fmt::Display for BillingInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A sellable plan tier from the static catalog.
///
/// # Invariants
///
/// - `plan_id` is unique within the catalog
/// - Paid plans have both a monthly and a yearly Stripe price
/// - Prices are stored as cents (never floats)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    /// Catalog identifier ("free", "pro", ...).
    pub plan_id: PlanId,

    /// Display name.
    pub name: String,

    /// Monthly price in cents.
    pub monthly_price: i64,

    /// Yearly price in cents.
    pub yearly_price: i64,

    /// ISO currency code, lowercase (e.g. "usd").
    pub currency: String,

    /// Stripe price id for the monthly cadence.
    pub stripe_monthly_price_id: Option<String>,

    /// Stripe price id for the yearly cadence.
    pub stripe_yearly_price_id: Option<String>,

    /// Stripe product owning both prices.
    pub stripe_product_id: Option<String>,

    /// Whether the plan is currently offered.
    pub is_active: bool,
}

impl SubscriptionPlan {
    /// Returns true if the given price ref is one of this plan's prices.
    pub fn matches_price(&self, price_ref: &str) -> bool {
        self.stripe_monthly_price_id.as_deref() == Some(price_ref)
            || self.stripe_yearly_price_id.as_deref() == Some(price_ref)
    }

    /// Returns the cadence a given price ref bills at, if it belongs to this plan.
    pub fn interval_for_price(&self, price_ref: &str) -> Option<BillingInterval> {
        if self.stripe_monthly_price_id.as_deref() == Some(price_ref) {
            Some(BillingInterval::Month)
        } else if self.stripe_yearly_price_id.as_deref() == Some(price_ref) {
            Some(BillingInterval::Year)
        } else {
            None
        }
    }
}
