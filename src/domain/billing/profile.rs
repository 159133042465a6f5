//! User billing profile.
//!
//! Maps an internal user to their payment-provider customer. Created lazily
//! the first time the user starts a checkout or portal flow; webhook handlers
//! attach the customer id when the provider reports it first.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, UserId};

/// Billing-facing profile for a user.
///
/// `stripe_customer_id` is 1:1 with the provider customer once populated and
/// must agree with the customer id on the user's subscription record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Owning user.
    pub user_id: UserId,

    /// Email captured when the profile was created.
    pub email: Option<String>,

    /// Payment-provider customer reference (cus_...).
    pub stripe_customer_id: Option<String>,

    /// Last price the provider reported for this user (display mirror).
    pub stripe_price_id: Option<String>,

    /// Last product the provider reported for this user (display mirror).
    pub stripe_product_id: Option<String>,

    /// When the profile was created.
    pub created_at: Timestamp,

    /// When the profile was last updated.
    pub updated_at: Timestamp,
}

impl UserProfile {
    /// Creates a fresh profile with no provider customer attached.
    pub fn new(user_id: UserId, email: Option<String>) -> Self {
        let now = Timestamp::now();
        Self {
            user_id,
            email,
            stripe_customer_id: None,
            stripe_price_id: None,
            stripe_product_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attaches a provider customer id to this profile.
    pub fn attach_customer(&mut self, customer_id: impl Into<String>) {
        self.stripe_customer_id = Some(customer_id.into());
        self.updated_at = Timestamp::now();
    }

    /// Records the latest price/product the provider reported.
    ///
    /// Display convenience only; subscription state lives on the
    /// `UserSubscription` record.
    pub fn record_latest_pricing(
        &mut self,
        price_id: Option<String>,
        product_id: Option<String>,
    ) {
        self.stripe_price_id = price_id;
        self.stripe_product_id = product_id;
        self.updated_at = Timestamp::now();
    }
}
