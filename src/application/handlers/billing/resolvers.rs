//! Identity and plan resolution.
//!
//! Webhook payloads speak in provider references (customer ids, price ids);
//! the rest of the system speaks in user ids and catalog plan ids. These
//! resolvers translate between the two. Both are read-only and both treat a
//! miss as a normal outcome, not an error: events can legitimately reference
//! customers or prices outside this deployment.

use std::sync::Arc;

use crate::domain::billing::SubscriptionPlan;
use crate::domain::foundation::{DomainError, UserId};
use crate::ports::{PlanCatalog, ProfileRepository};

/// Maps payment-provider customer references to internal user ids.
pub struct IdentityResolver {
    profiles: Arc<dyn ProfileRepository>,
}

impl IdentityResolver {
    pub fn new(profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { profiles }
    }

    /// Resolve a provider customer reference to the owning user.
    ///
    /// `Ok(None)` means no profile carries this customer id; callers log and
    /// abort their own mutation without failing the delivery.
    pub async fn resolve_customer(
        &self,
        customer_ref: &str,
    ) -> Result<Option<UserId>, DomainError> {
        let profile = self.profiles.find_by_stripe_customer_id(customer_ref).await?;
        Ok(profile.map(|p| p.user_id))
    }
}

/// Maps payment-provider price references to catalog plans.
pub struct PlanResolver {
    catalog: Arc<dyn PlanCatalog>,
}

impl PlanResolver {
    pub fn new(catalog: Arc<dyn PlanCatalog>) -> Self {
        Self { catalog }
    }

    /// Resolve a provider price reference to the plan selling it.
    ///
    /// Matches against either the monthly or the yearly price id. `Ok(None)`
    /// is non-fatal: the upsert is skipped so an unrecognized price can never
    /// downgrade or corrupt existing subscription state.
    pub async fn resolve_price(
        &self,
        price_ref: &str,
    ) -> Result<Option<SubscriptionPlan>, DomainError> {
        self.catalog.find_by_price_id(price_ref).await
    }
}
