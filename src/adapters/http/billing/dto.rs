//! HTTP DTOs for billing endpoints.
//!
//! JSON request/response shapes for the billing API. Checkout requests use
//! camelCase keys; portal requests and all portal response fields use
//! snake_case, matching the client contract.

use serde::{Deserialize, Serialize};

use crate::application::handlers::billing::{CheckoutIssued, PortalIssued};
use crate::domain::billing::{BillingInterval, SubscriptionStatus, UserSubscription};
use crate::ports::PortalFlow;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to open a checkout session.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Stripe price to subscribe to.
    pub price_id: String,
    /// Catalog plan being purchased.
    pub plan_id: String,
    /// Billing cadence the price bills at.
    pub billing_interval: BillingInterval,
}

/// Request to open a billing portal session.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PortalRequest {
    /// Optional portal flow to open into.
    #[serde(default)]
    pub flow_type: Option<PortalFlow>,
    /// Optional return URL override.
    #[serde(default)]
    pub return_url: Option<String>,
    /// Optional portal configuration id.
    #[serde(default)]
    pub configuration_id: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Success envelope wrapping endpoint data.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Acknowledgement for a verified webhook delivery.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

impl WebhookAck {
    pub fn received() -> Self {
        Self { received: true }
    }
}

/// Checkout session data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutData {
    pub url: String,
    pub session_id: String,
}

impl From<CheckoutIssued> for CheckoutData {
    fn from(issued: CheckoutIssued) -> Self {
        Self {
            url: issued.url,
            session_id: issued.session_id,
        }
    }
}

/// Portal session data.
#[derive(Debug, Clone, Serialize)]
pub struct PortalData {
    pub url: String,
    /// When the session was created (ISO 8601).
    pub created: String,
    /// When the session link stops being presented as usable (ISO 8601).
    pub expires_at: String,
    /// The flow the session was scoped to, if any.
    pub flow_type: Option<PortalFlow>,
    pub return_url: String,
}

impl From<PortalIssued> for PortalData {
    fn from(issued: PortalIssued) -> Self {
        Self {
            url: issued.url,
            created: issued.created.as_datetime().to_rfc3339(),
            expires_at: issued.expires_at.as_datetime().to_rfc3339(),
            flow_type: issued.flow,
            return_url: issued.return_url,
        }
    }
}

/// Subscription record as served to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionData {
    pub user_id: String,
    pub plan_id: String,
    pub stripe_subscription_id: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub status: SubscriptionStatus,
    pub current_period_start: Option<String>,
    pub current_period_end: Option<String>,
    pub cancel_at_period_end: bool,
    pub billing_interval: Option<BillingInterval>,
    pub trial_start: Option<String>,
    pub trial_end: Option<String>,
    pub has_access: bool,
}

impl From<UserSubscription> for SubscriptionData {
    fn from(sub: UserSubscription) -> Self {
        let has_access = sub.has_access();
        Self {
            user_id: sub.user_id.to_string(),
            plan_id: sub.plan_id.to_string(),
            stripe_subscription_id: sub.stripe_subscription_id,
            stripe_customer_id: sub.stripe_customer_id,
            status: sub.status,
            current_period_start: sub
                .current_period_start
                .map(|t| t.as_datetime().to_rfc3339()),
            current_period_end: sub.current_period_end.map(|t| t.as_datetime().to_rfc3339()),
            cancel_at_period_end: sub.cancel_at_period_end,
            billing_interval: sub.billing_interval,
            trial_start: sub.trial_start.map(|t| t.as_datetime().to_rfc3339()),
            trial_end: sub.trial_end.map(|t| t.as_datetime().to_rfc3339()),
            has_access,
        }
    }
}

/// Error envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use serde_json::json;

    #[test]
    fn checkout_request_uses_camel_case_keys() {
        let request: CheckoutRequest = serde_json::from_value(json!({
            "priceId": "price_pro_month",
            "planId": "pro",
            "billingInterval": "month"
        }))
        .unwrap();

        assert_eq!(request.price_id, "price_pro_month");
        assert_eq!(request.plan_id, "pro");
        assert_eq!(request.billing_interval, BillingInterval::Month);
    }

    #[test]
    fn portal_request_fields_are_optional() {
        let request: PortalRequest = serde_json::from_value(json!({})).unwrap();
        assert!(request.flow_type.is_none());
        assert!(request.return_url.is_none());

        let request: PortalRequest = serde_json::from_value(json!({
            "flow_type": "subscription_cancel",
            "return_url": "https://app/billing"
        }))
        .unwrap();
        assert_eq!(request.flow_type, Some(PortalFlow::SubscriptionCancel));
    }

    #[test]
    fn checkout_data_serializes_session_id_camel_case() {
        let data = CheckoutData {
            url: "https://checkout.stripe.com/x".to_string(),
            session_id: "cs_1".to_string(),
        };
        let json = serde_json::to_value(ApiResponse::ok(data)).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["sessionId"], "cs_1");
    }

    #[test]
    fn subscription_data_serializes_free_record() {
        let record = UserSubscription::free(UserId::new("u1").unwrap(), None);
        let data = SubscriptionData::from(record);
        let json = serde_json::to_value(&data).unwrap();

        assert_eq!(json["planId"], "free");
        assert_eq!(json["status"], "active");
        assert_eq!(json["currentPeriodEnd"], serde_json::Value::Null);
        assert_eq!(json["hasAccess"], true);
    }

    #[test]
    fn webhook_ack_serializes_received_true() {
        let json = serde_json::to_value(WebhookAck::received()).unwrap();
        assert_eq!(json, json!({"received": true}));
    }

    #[test]
    fn error_response_carries_code_and_message() {
        let json = serde_json::to_value(ErrorResponse::new("NOT_FOUND", "missing")).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "NOT_FOUND");
    }
}
