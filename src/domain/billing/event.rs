//! Provider webhook event types.
//!
//! The raw envelope arrives as JSON with a polymorphic `data.object`. After
//! signature verification the envelope is classified into [`BillingEvent`], a
//! closed union with one strongly-typed payload per recognized event type.
//! Payload structs parse defensively: the provider's schema is an external
//! contract, so every field tolerates being absent or null.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Raw webhook event envelope as delivered by the provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderEvent {
    /// Unique event identifier (evt_...).
    #[serde(default)]
    pub id: String,

    /// Event type (e.g. "customer.subscription.updated").
    #[serde(rename = "type", default)]
    pub event_type: String,

    /// Unix timestamp when the event was created.
    #[serde(default)]
    pub created: i64,

    /// Event payload containing the affected object.
    pub data: ProviderEventData,

    /// Whether this is a live or test event.
    #[serde(default)]
    pub livemode: bool,

    /// API version used to render this event.
    pub api_version: Option<String>,
}

/// Event data container.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderEventData {
    /// The object affected by this event (shape depends on event type).
    pub object: serde_json::Value,

    /// Previous values for updated fields (on update events).
    pub previous_attributes: Option<serde_json::Value>,
}

/// Recognized webhook events with typed payloads.
///
/// Anything outside the closed set lands in `Unrecognized` and is
/// acknowledged without processing.
#[derive(Debug, Clone)]
pub enum BillingEvent {
    CheckoutCompleted(CheckoutSessionPayload),
    SubscriptionCreated(SubscriptionSnapshot),
    SubscriptionUpdated(SubscriptionSnapshot),
    SubscriptionDeleted(SubscriptionSnapshot),
    InvoicePaymentSucceeded(InvoicePayload),
    InvoicePaymentFailed(InvoicePayload),
    Unrecognized { event_type: String },
}

/// Failure to interpret a recognized event's payload.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid payload for {event_type}: {reason}")]
pub struct EventPayloadError {
    pub event_type: String,
    pub reason: String,
}

impl BillingEvent {
    /// Classifies a verified envelope into a typed event.
    ///
    /// # Errors
    ///
    /// Returns [`EventPayloadError`] when a recognized event type carries a
    /// payload that does not deserialize. Unknown event types are not an
    /// error; they classify as `Unrecognized`.
    pub fn classify(envelope: &ProviderEvent) -> Result<Self, EventPayloadError> {
        fn payload<T: serde::de::DeserializeOwned>(
            envelope: &ProviderEvent,
        ) -> Result<T, EventPayloadError> {
            serde_json::from_value(envelope.data.object.clone()).map_err(|e| EventPayloadError {
                event_type: envelope.event_type.clone(),
                reason: e.to_string(),
            })
        }

        match envelope.event_type.as_str() {
            "checkout.session.completed" => Ok(Self::CheckoutCompleted(payload(envelope)?)),
            "customer.subscription.created" => Ok(Self::SubscriptionCreated(payload(envelope)?)),
            "customer.subscription.updated" => Ok(Self::SubscriptionUpdated(payload(envelope)?)),
            "customer.subscription.deleted" => Ok(Self::SubscriptionDeleted(payload(envelope)?)),
            "invoice.payment_succeeded" => Ok(Self::InvoicePaymentSucceeded(payload(envelope)?)),
            "invoice.payment_failed" => Ok(Self::InvoicePaymentFailed(payload(envelope)?)),
            other => Ok(Self::Unrecognized {
                event_type: other.to_string(),
            }),
        }
    }

    /// The provider-side event type string this variant corresponds to.
    pub fn event_type(&self) -> &str {
        match self {
            Self::CheckoutCompleted(_) => "checkout.session.completed",
            Self::SubscriptionCreated(_) => "customer.subscription.created",
            Self::SubscriptionUpdated(_) => "customer.subscription.updated",
            Self::SubscriptionDeleted(_) => "customer.subscription.deleted",
            Self::InvoicePaymentSucceeded(_) => "invoice.payment_succeeded",
            Self::InvoicePaymentFailed(_) => "invoice.payment_failed",
            Self::Unrecognized { event_type } => event_type,
        }
    }
}

/// Checkout session object from `checkout.session.completed`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CheckoutSessionPayload {
    /// Session identifier (cs_...).
    #[serde(default)]
    pub id: String,

    /// Customer created or attached during checkout.
    pub customer: Option<String>,

    /// Subscription created by the checkout, if any.
    pub subscription: Option<String>,

    /// Payment mode (payment, setup, subscription).
    pub mode: Option<String>,

    /// Session payment status.
    pub payment_status: Option<String>,

    /// Metadata set when the session was issued (user_id, plan_id, ...).
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSessionPayload {
    /// The internal user id the session was tagged with at issuance.
    pub fn user_id(&self) -> Option<&str> {
        self.metadata.get("user_id").map(String::as_str)
    }
}

/// Full provider subscription state, as carried by every
/// `customer.subscription.*` event.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SubscriptionSnapshot {
    /// Subscription identifier (sub_...).
    #[serde(default)]
    pub id: String,

    /// Owning customer.
    pub customer: Option<String>,

    /// Provider status string.
    #[serde(default)]
    pub status: String,

    /// Subscription items (the first item's price drives plan resolution).
    #[serde(default)]
    pub items: SnapshotItems,

    /// Current period start (Unix seconds).
    pub current_period_start: Option<i64>,

    /// Current period end (Unix seconds).
    pub current_period_end: Option<i64>,

    /// Whether the subscription cancels at period end.
    #[serde(default)]
    pub cancel_at_period_end: bool,

    /// Trial start (Unix seconds).
    pub trial_start: Option<i64>,

    /// Trial end (Unix seconds).
    pub trial_end: Option<i64>,

    /// Custom metadata.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl SubscriptionSnapshot {
    /// The price on the first subscription item, if present.
    pub fn primary_price(&self) -> Option<&PriceSnapshot> {
        self.items.data.first().and_then(|item| item.price.as_ref())
    }
}

/// Subscription items container.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SnapshotItems {
    #[serde(default)]
    pub data: Vec<SnapshotItem>,
}

/// Single subscription item.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SnapshotItem {
    pub price: Option<PriceSnapshot>,
}

/// Price object embedded in a subscription item.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PriceSnapshot {
    /// Price identifier (price_...).
    #[serde(default)]
    pub id: String,

    /// Product this price belongs to.
    pub product: Option<String>,

    /// Recurring billing configuration.
    pub recurring: Option<PriceRecurring>,
}

impl PriceSnapshot {
    /// The recurring interval string, empty when the price is one-off.
    pub fn recurring_interval(&self) -> &str {
        self.recurring
            .as_ref()
            .map(|r| r.interval.as_str())
            .unwrap_or("")
    }
}

/// Recurring configuration of a price.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PriceRecurring {
    /// Billing interval (day, week, month, year).
    #[serde(default)]
    pub interval: String,
}

/// Invoice object from `invoice.payment_succeeded` / `invoice.payment_failed`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InvoicePayload {
    /// Invoice identifier (in_...).
    #[serde(default)]
    pub id: String,

    /// Owning customer.
    pub customer: Option<String>,

    /// Associated subscription, if any.
    pub subscription: Option<String>,

    /// Amount paid in cents.
    #[serde(default)]
    pub amount_paid: i64,

    /// Amount due in cents.
    #[serde(default)]
    pub amount_due: i64,

    /// Currency (lowercase).
    #[serde(default)]
    pub currency: String,

    /// Number of payment attempts made so far.
    #[serde(default)]
    pub attempt_count: i32,
}
