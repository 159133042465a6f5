//! Plan catalog port.

use async_trait::async_trait;

use crate::domain::billing::SubscriptionPlan;
use crate::domain::foundation::{DomainError, PlanId};

/// Read-only access to the subscription plan catalog.
///
/// The catalog is seeded externally; this service never writes to it. The
/// port is injected into the plan resolver so tests can substitute an
/// in-memory fixture.
#[async_trait]
pub trait PlanCatalog: Send + Sync {
    /// Find a plan by its catalog id.
    async fn find_by_id(&self, plan_id: &PlanId) -> Result<Option<SubscriptionPlan>, DomainError>;

    /// Find the plan whose monthly OR yearly Stripe price matches the ref.
    ///
    /// Returns `None` for unrecognized prices; callers skip the mutation and
    /// leave previous subscription state intact.
    async fn find_by_price_id(
        &self,
        price_ref: &str,
    ) -> Result<Option<SubscriptionPlan>, DomainError>;

    /// List all currently offered plans.
    async fn list_active(&self) -> Result<Vec<SubscriptionPlan>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_catalog_is_object_safe() {
        fn _accepts_dyn(_catalog: &dyn PlanCatalog) {}
    }
}
