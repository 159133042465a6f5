//! Billing-specific error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | InvalidSignature | 400 |
//! | Configuration | 500 (400 on the webhook endpoint) |
//! | Validation | 400 |
//! | CustomerNotConfigured | 404 |
//! | SubscriptionNotFound | 404 |
//! | PlanNotFound | 404 |
//! | ProviderApi | 500 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{DomainError, ErrorCode, UserId};

/// Billing operation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingError {
    /// Webhook signature verification failed.
    InvalidSignature,

    /// A required secret or setting is missing.
    Configuration(String),

    /// Required input is missing or malformed.
    Validation { field: String, message: String },

    /// The user has no provider customer yet.
    CustomerNotConfigured(UserId),

    /// No subscription record (or no provider subscription) for the user.
    SubscriptionNotFound(UserId),

    /// A price reference matched no catalog plan.
    PlanNotFound(String),

    /// The payment provider's API call failed.
    ProviderApi(String),

    /// Storage or other infrastructure failure.
    Infrastructure(String),
}

impl BillingError {
    pub fn invalid_signature() -> Self {
        BillingError::InvalidSignature
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        BillingError::Configuration(message.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        BillingError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn customer_not_configured(user_id: UserId) -> Self {
        BillingError::CustomerNotConfigured(user_id)
    }

    pub fn subscription_not_found(user_id: UserId) -> Self {
        BillingError::SubscriptionNotFound(user_id)
    }

    pub fn plan_not_found(price_ref: impl Into<String>) -> Self {
        BillingError::PlanNotFound(price_ref.into())
    }

    pub fn provider_api(message: impl Into<String>) -> Self {
        BillingError::ProviderApi(message.into())
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        BillingError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            BillingError::InvalidSignature => ErrorCode::InvalidWebhookSignature,
            BillingError::Configuration(_) => ErrorCode::ConfigurationError,
            BillingError::Validation { .. } => ErrorCode::ValidationFailed,
            BillingError::CustomerNotConfigured(_) => ErrorCode::CustomerNotFound,
            BillingError::SubscriptionNotFound(_) => ErrorCode::SubscriptionNotFound,
            BillingError::PlanNotFound(_) => ErrorCode::PlanNotFound,
            BillingError::ProviderApi(_) => ErrorCode::PaymentProviderError,
            BillingError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-facing error message.
    pub fn message(&self) -> String {
        match self {
            BillingError::InvalidSignature => "Invalid webhook signature".to_string(),
            BillingError::Configuration(detail) => {
                format!("Billing is not configured: {}", detail)
            }
            BillingError::Validation { field, message } => {
                format!("Invalid '{}': {}", field, message)
            }
            BillingError::CustomerNotConfigured(_) => {
                "No Stripe customer found - complete subscription setup first".to_string()
            }
            BillingError::SubscriptionNotFound(user_id) => {
                format!("No active subscription found for user {}", user_id)
            }
            BillingError::PlanNotFound(price_ref) => {
                format!("No plan matches price {}", price_ref)
            }
            BillingError::ProviderApi(detail) => {
                format!("Payment provider error: {}", detail)
            }
            BillingError::Infrastructure(detail) => format!("Error: {}", detail),
        }
    }
}

impl std::fmt::Display for BillingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for BillingError {}

impl From<DomainError> for BillingError {
    fn from(err: DomainError) -> Self {
        BillingError::Infrastructure(err.to_string())
    }
}

impl From<BillingError> for DomainError {
    fn from(err: BillingError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}
