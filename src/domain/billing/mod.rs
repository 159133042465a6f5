//! Billing domain module.
//!
//! The billing state synchronization core: plan catalog types, the user
//! billing profile, the single-record-per-user subscription aggregate, the
//! provider webhook event model, and signature verification.
//!
//! # Module Structure
//!
//! - `plan` - Catalog plan and billing interval
//! - `profile` - User billing profile (provider customer mapping)
//! - `subscription` - UserSubscription aggregate and status
//! - `event` - Webhook envelope and typed event union
//! - `webhook_verifier` - HMAC-SHA256 signature verification
//! - `errors` - BillingError taxonomy

mod errors;
mod event;
mod plan;
mod profile;
mod subscription;
mod webhook_verifier;

pub use errors::BillingError;
pub use event::{
    BillingEvent, CheckoutSessionPayload, EventPayloadError, InvoicePayload, PriceRecurring,
    PriceSnapshot, ProviderEvent, ProviderEventData, SnapshotItem, SnapshotItems,
    SubscriptionSnapshot,
};
pub use plan::{BillingInterval, SubscriptionPlan};
pub use profile::UserProfile;
pub use subscription::{SubscriptionStatus, UserSubscription};
pub use webhook_verifier::{hex_encode, SignatureHeader, WebhookError, WebhookVerifier};

#[cfg(test)]
pub use webhook_verifier::sign_test_payload;
