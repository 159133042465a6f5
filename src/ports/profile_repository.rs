//! Profile repository port.

use async_trait::async_trait;

use crate::domain::billing::UserProfile;
use crate::domain::foundation::{DomainError, UserId};

/// Persistence port for user billing profiles.
///
/// Profiles are keyed by user id; the provider customer id is unique across
/// profiles once assigned, which is what makes customer-to-user resolution
/// possible for webhook events.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Find a profile by its owning user.
    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Option<UserProfile>, DomainError>;

    /// Find a profile by the payment provider's customer reference.
    ///
    /// Returns `None` when no profile carries this customer id. Callers must
    /// treat this as non-fatal: the event may reference a customer outside
    /// this deployment (e.g. a stale environment).
    async fn find_by_stripe_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<UserProfile>, DomainError>;

    /// Insert or fully replace the profile keyed by its user id.
    async fn upsert(&self, profile: &UserProfile) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn ProfileRepository) {}
    }
}
