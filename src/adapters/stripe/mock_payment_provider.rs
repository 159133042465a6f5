//! Mock payment provider for testing.
//!
//! Configurable implementation of `PaymentProvider` for unit and integration
//! tests. Supports pre-configured responses, error injection, and call
//! tracking.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use crate::domain::billing::SubscriptionSnapshot;
use crate::ports::{
    CreateCheckoutRequest, CreateCustomerRequest, CreatePortalRequest, Customer,
    HostedCheckoutSession, HostedPortalSession, PaymentError, PaymentProvider,
};

/// Mock payment provider.
///
/// ```ignore
/// let mock = MockPaymentProvider::new();
/// mock.set_active_subscription("sub_456");
/// assert_eq!(mock.calls("create_customer"), 0);
/// ```
#[derive(Default)]
pub struct MockPaymentProvider {
    state: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    /// Fail every call when set.
    fail_all: bool,

    /// Subscription id returned by `find_active_subscription`.
    active_subscription_id: Option<String>,

    /// Snapshot returned by `set_cancel_at_period_end`.
    cancellation_response: Option<SubscriptionSnapshot>,

    /// Recorded method names, in call order.
    call_log: Vec<String>,

    /// Last requests, for assertions.
    last_checkout_request: Option<CreateCheckoutRequest>,
    last_portal_request: Option<CreatePortalRequest>,
}

impl MockPaymentProvider {
    /// Create a mock that succeeds with canned responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock where every call fails with a provider error.
    pub fn failing() -> Self {
        let mock = Self::new();
        mock.state.lock().unwrap().fail_all = true;
        mock
    }

    /// Configure the active subscription `find_active_subscription` returns.
    pub fn set_active_subscription(&self, subscription_id: &str) {
        self.state.lock().unwrap().active_subscription_id = Some(subscription_id.to_string());
    }

    /// Configure the snapshot `set_cancel_at_period_end` returns.
    pub fn set_cancellation_response(
        &self,
        subscription_id: &str,
        customer_id: &str,
        price_id: &str,
        cancel_at_period_end: bool,
    ) {
        let snapshot: SubscriptionSnapshot = serde_json::from_value(json!({
            "id": subscription_id,
            "customer": customer_id,
            "status": "active",
            "current_period_start": 1704067200,
            "current_period_end": 1706745600,
            "cancel_at_period_end": cancel_at_period_end,
            "items": {"data": [{"price": {
                "id": price_id,
                "product": "prod_pro",
                "recurring": {"interval": "month"}
            }}]}
        }))
        .expect("valid mock snapshot");
        self.state.lock().unwrap().cancellation_response = Some(snapshot);
    }

    /// Number of calls recorded for a method name.
    pub fn calls(&self, method: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .call_log
            .iter()
            .filter(|m| m.as_str() == method)
            .count()
    }

    /// The last checkout session request, if any.
    pub fn last_checkout_request(&self) -> Option<CreateCheckoutRequest> {
        self.state.lock().unwrap().last_checkout_request.clone()
    }

    /// The last portal session request, if any.
    pub fn last_portal_request(&self) -> Option<CreatePortalRequest> {
        self.state.lock().unwrap().last_portal_request.clone()
    }

    fn record(&self, method: &str) -> Result<(), PaymentError> {
        let mut state = self.state.lock().unwrap();
        state.call_log.push(method.to_string());
        if state.fail_all {
            Err(PaymentError::provider(format!(
                "mock failure in {}",
                method
            )))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, PaymentError> {
        self.record("create_customer")?;
        Ok(Customer {
            id: format!("cus_mock_{}", request.user_id),
            email: Some(request.email),
            created: 1704067200,
        })
    }

    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<HostedCheckoutSession, PaymentError> {
        self.record("create_checkout_session")?;
        self.state.lock().unwrap().last_checkout_request = Some(request);
        Ok(HostedCheckoutSession {
            id: "cs_mock_1".to_string(),
            url: "https://checkout.stripe.com/c/pay/cs_mock_1".to_string(),
        })
    }

    async fn create_portal_session(
        &self,
        request: CreatePortalRequest,
    ) -> Result<HostedPortalSession, PaymentError> {
        self.record("create_portal_session")?;
        self.state.lock().unwrap().last_portal_request = Some(request);
        Ok(HostedPortalSession {
            id: "bps_mock_1".to_string(),
            url: "https://billing.stripe.com/session/bps_mock_1".to_string(),
            created: 1704067200,
        })
    }

    async fn find_active_subscription(
        &self,
        customer_id: &str,
    ) -> Result<Option<SubscriptionSnapshot>, PaymentError> {
        self.record("find_active_subscription")?;
        let state = self.state.lock().unwrap();
        Ok(state.active_subscription_id.as_ref().map(|id| {
            serde_json::from_value(json!({
                "id": id,
                "customer": customer_id,
                "status": "active",
                "items": {"data": []}
            }))
            .expect("valid mock snapshot")
        }))
    }

    async fn set_cancel_at_period_end(
        &self,
        subscription_id: &str,
        cancel: bool,
    ) -> Result<SubscriptionSnapshot, PaymentError> {
        self.record("set_cancel_at_period_end")?;
        let state = self.state.lock().unwrap();
        if let Some(snapshot) = &state.cancellation_response {
            return Ok(snapshot.clone());
        }
        Ok(serde_json::from_value(json!({
            "id": subscription_id,
            "status": "active",
            "cancel_at_period_end": cancel,
            "items": {"data": []}
        }))
        .expect("valid mock snapshot"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;

    #[tokio::test]
    async fn records_calls_in_order() {
        let mock = MockPaymentProvider::new();
        mock.create_customer(CreateCustomerRequest {
            user_id: UserId::new("u1").unwrap(),
            email: "a@b.co".to_string(),
        })
        .await
        .unwrap();

        assert_eq!(mock.calls("create_customer"), 1);
        assert_eq!(mock.calls("create_portal_session"), 0);
    }

    #[tokio::test]
    async fn failing_mock_errors_every_call() {
        let mock = MockPaymentProvider::failing();
        let result = mock.find_active_subscription("cus_1").await;
        assert!(result.is_err());
        // The call is still recorded.
        assert_eq!(mock.calls("find_active_subscription"), 1);
    }

    #[tokio::test]
    async fn active_subscription_is_configurable() {
        let mock = MockPaymentProvider::new();
        assert!(mock
            .find_active_subscription("cus_1")
            .await
            .unwrap()
            .is_none());

        mock.set_active_subscription("sub_9");
        let found = mock.find_active_subscription("cus_1").await.unwrap();
        assert_eq!(found.unwrap().id, "sub_9");
    }
}
