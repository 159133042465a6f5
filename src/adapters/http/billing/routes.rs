//! Axum router configuration for billing endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    cancel_subscription, create_checkout, create_portal, get_subscription, handle_webhook,
    resume_subscription, BillingAppState,
};

/// Create the billing API router.
///
/// # Routes
///
/// ## User endpoints (require authentication)
/// - `GET /subscription` - Current subscription record
/// - `POST /checkout` - Open a hosted checkout session
/// - `POST /portal` - Open a hosted billing portal session
/// - `POST /cancel` - Cancel at period end
/// - `POST /resume` - Clear a pending cancellation
///
/// ## Webhook endpoint (no auth, signature verified)
/// - `POST /webhook` - Ingest provider webhook deliveries
pub fn billing_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/subscription", get(get_subscription))
        .route("/checkout", post(create_checkout))
        .route("/portal", post(create_portal))
        .route("/cancel", post(cancel_subscription))
        .route("/resume", post(resume_subscription))
        .route("/webhook", post(handle_webhook))
}

/// Create the complete billing module router, mounted at `/billing`.
pub fn billing_router() -> Router<BillingAppState> {
    Router::new().nest("/billing", billing_routes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::adapters::memory::{
        InMemoryPlanCatalog, InMemoryProfileRepository, InMemorySubscriptionStore,
    };
    use crate::adapters::stripe::MockPaymentProvider;
    use crate::config::PaymentConfig;

    fn test_state() -> BillingAppState {
        BillingAppState {
            profiles: Arc::new(InMemoryProfileRepository::new()),
            catalog: Arc::new(InMemoryPlanCatalog::with_plans(vec![])),
            subscriptions: Arc::new(InMemorySubscriptionStore::new()),
            payment_provider: Arc::new(MockPaymentProvider::new()),
            payment_config: Arc::new(PaymentConfig::default()),
        }
    }

    #[test]
    fn billing_routes_creates_router() {
        let router = billing_routes();
        let _: Router<()> = router.with_state(test_state());
    }

    #[test]
    fn billing_router_nests_under_billing() {
        let router = billing_router();
        let _: Router<()> = router.with_state(test_state());
    }
}
