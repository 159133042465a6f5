//! Payment provider port.
//!
//! Contract for the hosted payment gateway (Stripe in production). The port
//! covers exactly what the billing core needs: customer creation, hosted
//! checkout and portal sessions, and the subscription calls whose responses
//! feed back into state reconciliation.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::billing::{BillingError, SubscriptionSnapshot};
use crate::domain::foundation::UserId;

/// Port for payment provider integrations.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a customer in the payment system, tagged with the internal
    /// user id so webhook handlers can resolve it back.
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, PaymentError>;

    /// Open a subscription-mode hosted checkout session.
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<HostedCheckoutSession, PaymentError>;

    /// Open a hosted billing portal session, optionally scoped to a flow.
    async fn create_portal_session(
        &self,
        request: CreatePortalRequest,
    ) -> Result<HostedPortalSession, PaymentError>;

    /// Find the customer's current active subscription, if any.
    async fn find_active_subscription(
        &self,
        customer_id: &str,
    ) -> Result<Option<SubscriptionSnapshot>, PaymentError>;

    /// Toggle cancel-at-period-end on a subscription.
    ///
    /// Returns the provider's resulting subscription state so the caller can
    /// re-derive local state from it.
    async fn set_cancel_at_period_end(
        &self,
        subscription_id: &str,
        cancel: bool,
    ) -> Result<SubscriptionSnapshot, PaymentError>;
}

/// Request to create a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCustomerRequest {
    /// Internal user id (stored as provider metadata).
    pub user_id: UserId,

    /// Customer email address.
    pub email: String,
}

/// Customer in the payment system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    /// Provider's customer id (cus_...).
    pub id: String,

    /// Customer email.
    pub email: Option<String>,

    /// When the customer was created (provider timestamp).
    pub created: i64,
}

/// Request to open a checkout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCheckoutRequest {
    /// Provider customer to attach the session to.
    pub customer_id: String,

    /// Stripe price to subscribe to.
    pub price_id: String,

    /// Redirect after successful checkout.
    pub success_url: String,

    /// Redirect after abandoned checkout.
    pub cancel_url: String,

    /// Session metadata consumed later by `checkout.session.completed`
    /// (user_id, plan_id, billing_interval).
    pub metadata: HashMap<String, String>,
}

/// Hosted checkout session handed back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostedCheckoutSession {
    /// Provider's session id (cs_...).
    pub id: String,

    /// URL the user completes payment at.
    pub url: String,
}

/// Billing portal flow selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortalFlow {
    SubscriptionUpdate,
    SubscriptionCancel,
    PaymentMethodUpdate,
    SubscriptionUpdateConfirm,
}

impl PortalFlow {
    /// Provider-side flow type string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PortalFlow::SubscriptionUpdate => "subscription_update",
            PortalFlow::SubscriptionCancel => "subscription_cancel",
            PortalFlow::PaymentMethodUpdate => "payment_method_update",
            PortalFlow::SubscriptionUpdateConfirm => "subscription_update_confirm",
        }
    }

    /// Whether the flow targets a specific provider subscription.
    ///
    /// Targeting flows need an active subscription id in the flow payload;
    /// without one the portal session is issued without flow data.
    pub fn targets_subscription(&self) -> bool {
        !matches!(self, PortalFlow::PaymentMethodUpdate)
    }
}

impl std::fmt::Display for PortalFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Flow payload attached to a portal session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalFlowData {
    /// Which flow the portal opens into.
    pub flow: PortalFlow,

    /// Provider subscription the flow operates on, when the flow targets one.
    pub subscription_id: Option<String>,
}

/// Request to open a billing portal session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePortalRequest {
    /// Provider customer the portal session belongs to.
    pub customer_id: String,

    /// Where the portal sends the user back to.
    pub return_url: String,

    /// Optional portal configuration id.
    pub configuration_id: Option<String>,

    /// Optional flow payload; omitted for generic portal sessions.
    pub flow_data: Option<PortalFlowData>,
}

/// Hosted portal session handed back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostedPortalSession {
    /// Provider's session id (bps_...).
    pub id: String,

    /// URL the user manages their subscription at.
    pub url: String,

    /// When the session was created (Unix seconds).
    pub created: i64,
}

/// Errors from payment provider operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentError {
    /// Error code for categorization.
    pub code: PaymentErrorCode,

    /// Human-readable message.
    pub message: String,

    /// Provider's error code (if available).
    pub provider_code: Option<String>,

    /// Whether the operation can be retried.
    pub retryable: bool,
}

impl PaymentError {
    /// Create a new payment error.
    pub fn new(code: PaymentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    /// Attach the provider's own error code.
    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::NetworkError, message)
    }

    /// Create a provider API error.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::ProviderError, message)
    }

    /// Create a not found error.
    pub fn not_found(resource: &str) -> Self {
        Self::new(PaymentErrorCode::NotFound, format!("{} not found", resource))
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PaymentError {}

impl From<PaymentError> for BillingError {
    fn from(err: PaymentError) -> Self {
        BillingError::provider_api(err.to_string())
    }
}

/// Payment error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentErrorCode {
    /// Network connectivity issue.
    NetworkError,

    /// API authentication failed.
    AuthenticationError,

    /// Resource not found.
    NotFound,

    /// Rate limit exceeded.
    RateLimitExceeded,

    /// Provider API error.
    ProviderError,

    /// Unknown error.
    Unknown,
}

impl PaymentErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentErrorCode::NetworkError | PaymentErrorCode::RateLimitExceeded
        )
    }
}

impl std::fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentErrorCode::NetworkError => "network_error",
            PaymentErrorCode::AuthenticationError => "authentication_error",
            PaymentErrorCode::NotFound => "not_found",
            PaymentErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            PaymentErrorCode::ProviderError => "provider_error",
            PaymentErrorCode::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}
