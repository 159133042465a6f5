//! Webhook ingestion and dispatch.
//!
//! Verifies the delivery signature, classifies the event, and routes it to
//! the matching handler. The acknowledgement contract is decided entirely by
//! signature validity: once verified, the delivery is acknowledged even when
//! a downstream handler fails, because the provider redelivers on non-2xx
//! and blind redelivery of an already-half-applied event only duplicates
//! side effects. Downstream failures surface through logs, never HTTP.

use std::sync::Arc;

use crate::domain::billing::{
    BillingError, BillingEvent, CheckoutSessionPayload, InvoicePayload, UserProfile,
    WebhookVerifier,
};
use crate::domain::foundation::UserId;
use crate::ports::ProfileRepository;

use super::resolvers::IdentityResolver;
use super::sync_subscription::SyncSubscriptionHandler;

/// Command carrying one raw webhook delivery.
#[derive(Debug, Clone)]
pub struct ProcessWebhookCommand {
    /// Raw request body (the signed payload).
    pub payload: Vec<u8>,
    /// Value of the provider signature header.
    pub signature: String,
}

/// How a verified delivery was disposed of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookDisposition {
    /// A handler ran to completion.
    Handled,
    /// The event type is outside the recognized set.
    Ignored,
    /// A handler failed; logged and swallowed.
    Failed,
}

/// Receipt for an acknowledged delivery.
#[derive(Debug, Clone)]
pub struct WebhookReceipt {
    pub event_id: String,
    pub event_type: String,
    pub disposition: WebhookDisposition,
}

/// Verifies and dispatches provider webhook deliveries.
pub struct ProcessWebhookHandler {
    webhook_secret: String,
    profiles: Arc<dyn ProfileRepository>,
    identity: IdentityResolver,
    sync: Arc<SyncSubscriptionHandler>,
}

impl ProcessWebhookHandler {
    pub fn new(
        webhook_secret: impl Into<String>,
        profiles: Arc<dyn ProfileRepository>,
        sync: Arc<SyncSubscriptionHandler>,
    ) -> Self {
        Self {
            webhook_secret: webhook_secret.into(),
            identity: IdentityResolver::new(profiles.clone()),
            profiles,
            sync,
        }
    }

    /// Process one delivery.
    ///
    /// # Errors
    ///
    /// - `Configuration` when the signing secret is absent
    /// - `InvalidSignature` when verification fails (nothing is processed)
    ///
    /// Handler failures after verification do NOT error; the receipt records
    /// them as `Failed`.
    pub async fn handle(
        &self,
        cmd: ProcessWebhookCommand,
    ) -> Result<WebhookReceipt, BillingError> {
        if self.webhook_secret.is_empty() {
            return Err(BillingError::configuration(
                "webhook signing secret is not set",
            ));
        }

        let verifier = WebhookVerifier::new(self.webhook_secret.clone());
        let envelope = verifier
            .verify_and_parse(&cmd.payload, &cmd.signature)
            .map_err(|err| {
                tracing::warn!(error = %err, "Webhook signature verification failed");
                BillingError::invalid_signature()
            })?;

        let event_id = envelope.id.clone();
        let event_type = envelope.event_type.clone();

        let event = match BillingEvent::classify(&envelope) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(
                    event_id = %event_id,
                    event_type = %event_type,
                    error = %err,
                    "Recognized event type with unusable payload"
                );
                return Ok(WebhookReceipt {
                    event_id,
                    event_type,
                    disposition: WebhookDisposition::Failed,
                });
            }
        };

        let disposition = self.dispatch(&event).await;

        tracing::info!(
            event_id = %event_id,
            event_type = %event_type,
            disposition = ?disposition,
            "Webhook delivery acknowledged"
        );

        Ok(WebhookReceipt {
            event_id,
            event_type,
            disposition,
        })
    }

    /// Route a classified event to its handler, containing failures.
    async fn dispatch(&self, event: &BillingEvent) -> WebhookDisposition {
        let result = match event {
            BillingEvent::CheckoutCompleted(session) => {
                self.handle_checkout_completed(session).await
            }
            BillingEvent::SubscriptionCreated(snapshot)
            | BillingEvent::SubscriptionUpdated(snapshot) => {
                self.sync.apply_snapshot(snapshot).await.map(|_| ())
            }
            BillingEvent::SubscriptionDeleted(snapshot) => {
                self.sync.revert_to_free(snapshot).await.map(|_| ())
            }
            BillingEvent::InvoicePaymentSucceeded(invoice) => {
                self.handle_invoice_paid(invoice).await
            }
            BillingEvent::InvoicePaymentFailed(invoice) => {
                self.handle_invoice_failed(invoice).await
            }
            BillingEvent::Unrecognized { event_type } => {
                tracing::debug!(event_type = %event_type, "Ignoring unrecognized webhook event type");
                return WebhookDisposition::Ignored;
            }
        };

        match result {
            Ok(()) => WebhookDisposition::Handled,
            Err(err) => {
                // Signature already validated: swallow so the provider does
                // not redeliver into the same failure.
                tracing::error!(
                    event_type = event.event_type(),
                    error = %err,
                    "Webhook handler failed after acknowledgement was decided"
                );
                WebhookDisposition::Failed
            }
        }
    }

    /// `checkout.session.completed`: attach the provider customer to the
    /// profile of the user the session was issued for.
    async fn handle_checkout_completed(
        &self,
        session: &CheckoutSessionPayload,
    ) -> Result<(), BillingError> {
        let Some(user_ref) = session.user_id() else {
            tracing::warn!(
                session_id = %session.id,
                "Checkout session completed without user_id metadata"
            );
            return Ok(());
        };

        let Some(customer_ref) = session.customer.as_deref() else {
            tracing::warn!(
                session_id = %session.id,
                "Checkout session completed without a customer"
            );
            return Ok(());
        };

        let user_id = UserId::new(user_ref)
            .map_err(|e| BillingError::validation("user_id", e.to_string()))?;

        let mut profile = match self.profiles.find_by_user_id(&user_id).await? {
            Some(profile) => profile,
            None => UserProfile::new(user_id.clone(), None),
        };
        profile.attach_customer(customer_ref);
        self.profiles.upsert(&profile).await?;

        tracing::info!(
            user_id = %user_id,
            customer_ref,
            session_id = %session.id,
            "Checkout completed, customer attached to profile"
        );

        Ok(())
    }

    /// `invoice.payment_succeeded`: log only. Renewal state arrives through
    /// the subscription events, and a one-shot side effect here (email,
    /// ledger entry) would first need event-id deduplication.
    async fn handle_invoice_paid(&self, invoice: &InvoicePayload) -> Result<(), BillingError> {
        let user = match invoice.customer.as_deref() {
            Some(customer_ref) => self.identity.resolve_customer(customer_ref).await?,
            None => None,
        };

        tracing::info!(
            invoice_id = %invoice.id,
            user_id = user.as_ref().map(|u| u.as_str()).unwrap_or("unknown"),
            amount_paid = invoice.amount_paid,
            currency = %invoice.currency,
            "Invoice payment succeeded"
        );

        Ok(())
    }

    /// `invoice.payment_failed`: log only. The subscription's `past_due`
    /// status arrives via `customer.subscription.updated`.
    async fn handle_invoice_failed(&self, invoice: &InvoicePayload) -> Result<(), BillingError> {
        let user = match invoice.customer.as_deref() {
            Some(customer_ref) => self.identity.resolve_customer(customer_ref).await?,
            None => None,
        };

        tracing::warn!(
            invoice_id = %invoice.id,
            user_id = user.as_ref().map(|u| u.as_str()).unwrap_or("unknown"),
            amount_due = invoice.amount_due,
            attempt_count = invoice.attempt_count,
            "Invoice payment failed"
        );

        Ok(())
    }
}
