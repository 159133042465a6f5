//! Checkout session issuance.
//!
//! Opens a subscription-mode hosted checkout session for a chosen price.
//! Customer discovery is isolated in `get_or_create_customer` with an
//! explicit create-vs-reuse branch so callers and tests can observe which
//! path was taken.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::billing::{BillingError, BillingInterval, UserProfile};
use crate::domain::foundation::{PlanId, UserId};
use crate::ports::{
    CreateCheckoutRequest, CreateCustomerRequest, PaymentProvider, ProfileRepository,
};

/// Command to open a checkout session.
#[derive(Debug, Clone)]
pub struct CreateCheckoutCommand {
    pub user_id: UserId,
    pub email: String,
    pub price_id: String,
    pub plan_id: PlanId,
    pub billing_interval: BillingInterval,
}

/// Which branch `get_or_create_customer` took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerSource {
    /// A provider customer was created and persisted on the profile.
    Created,
    /// The profile already carried a provider customer.
    Reused,
}

/// Issued checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutIssued {
    pub url: String,
    pub session_id: String,
    pub customer_source: CustomerSource,
}

/// Handler for opening hosted checkout sessions.
pub struct CreateCheckoutHandler {
    secret_key_configured: bool,
    success_url: String,
    cancel_url: String,
    profiles: Arc<dyn ProfileRepository>,
    payment_provider: Arc<dyn PaymentProvider>,
}

impl CreateCheckoutHandler {
    pub fn new(
        secret_key_configured: bool,
        success_url: impl Into<String>,
        cancel_url: impl Into<String>,
        profiles: Arc<dyn ProfileRepository>,
        payment_provider: Arc<dyn PaymentProvider>,
    ) -> Self {
        Self {
            secret_key_configured,
            success_url: success_url.into(),
            cancel_url: cancel_url.into(),
            profiles,
            payment_provider,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateCheckoutCommand,
    ) -> Result<CheckoutIssued, BillingError> {
        if !self.secret_key_configured {
            return Err(BillingError::configuration(
                "payment provider secret key is not set",
            ));
        }
        if cmd.price_id.is_empty() {
            return Err(BillingError::validation("priceId", "must not be empty"));
        }
        if cmd.email.is_empty() {
            return Err(BillingError::validation("email", "must not be empty"));
        }

        let (customer_id, customer_source) = self.get_or_create_customer(&cmd).await?;

        let mut metadata = HashMap::new();
        metadata.insert("user_id".to_string(), cmd.user_id.to_string());
        metadata.insert("plan_id".to_string(), cmd.plan_id.to_string());
        metadata.insert(
            "billing_interval".to_string(),
            cmd.billing_interval.to_string(),
        );

        let session = self
            .payment_provider
            .create_checkout_session(CreateCheckoutRequest {
                customer_id: customer_id.clone(),
                price_id: cmd.price_id.clone(),
                success_url: self.success_url.clone(),
                cancel_url: self.cancel_url.clone(),
                metadata,
            })
            .await?;

        tracing::info!(
            user_id = %cmd.user_id,
            plan_id = %cmd.plan_id,
            price_id = %cmd.price_id,
            customer_id = %customer_id,
            customer_source = ?customer_source,
            session_id = %session.id,
            "Checkout session issued"
        );

        Ok(CheckoutIssued {
            url: session.url,
            session_id: session.id,
            customer_source,
        })
    }

    /// Reuse the profile's provider customer or create one.
    ///
    /// Creation tags the customer with the internal user id and persists the
    /// new id on the profile (creating the profile lazily when this is the
    /// user's first billing interaction).
    async fn get_or_create_customer(
        &self,
        cmd: &CreateCheckoutCommand,
    ) -> Result<(String, CustomerSource), BillingError> {
        let existing = self.profiles.find_by_user_id(&cmd.user_id).await?;

        if let Some(customer_id) = existing
            .as_ref()
            .and_then(|p| p.stripe_customer_id.clone())
        {
            return Ok((customer_id, CustomerSource::Reused));
        }

        let customer = self
            .payment_provider
            .create_customer(CreateCustomerRequest {
                user_id: cmd.user_id.clone(),
                email: cmd.email.clone(),
            })
            .await?;

        let mut profile = existing
            .unwrap_or_else(|| UserProfile::new(cmd.user_id.clone(), Some(cmd.email.clone())));
        profile.attach_customer(customer.id.clone());
        self.profiles.upsert(&profile).await?;

        Ok((customer.id, CustomerSource::Created))
    }
}
