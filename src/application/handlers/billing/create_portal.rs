//! Billing portal session issuance.
//!
//! Opens a hosted self-service billing session, optionally scoped to a
//! specific flow. Flows that target a subscription degrade gracefully: a
//! user on the free plan still gets a generic portal session, just without
//! the flow payload.

use std::sync::Arc;

use crate::domain::billing::BillingError;
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{
    CreatePortalRequest, PaymentProvider, PortalFlow, PortalFlowData, ProfileRepository,
};

/// How long an issued portal link is presented as usable (seconds).
const PORTAL_SESSION_TTL_SECS: i64 = 3600;

/// Command to open a portal session.
#[derive(Debug, Clone)]
pub struct CreatePortalCommand {
    pub user_id: UserId,
    pub flow: Option<PortalFlow>,
    pub return_url: Option<String>,
    pub configuration_id: Option<String>,
}

/// Issued portal session.
#[derive(Debug, Clone)]
pub struct PortalIssued {
    pub url: String,
    pub created: Timestamp,
    pub expires_at: Timestamp,
    pub flow: Option<PortalFlow>,
    pub return_url: String,
}

/// Handler for opening hosted billing portal sessions.
pub struct CreatePortalHandler {
    secret_key_configured: bool,
    default_return_url: String,
    profiles: Arc<dyn ProfileRepository>,
    payment_provider: Arc<dyn PaymentProvider>,
}

impl CreatePortalHandler {
    pub fn new(
        secret_key_configured: bool,
        default_return_url: impl Into<String>,
        profiles: Arc<dyn ProfileRepository>,
        payment_provider: Arc<dyn PaymentProvider>,
    ) -> Self {
        Self {
            secret_key_configured,
            default_return_url: default_return_url.into(),
            profiles,
            payment_provider,
        }
    }

    pub async fn handle(&self, cmd: CreatePortalCommand) -> Result<PortalIssued, BillingError> {
        if !self.secret_key_configured {
            return Err(BillingError::configuration(
                "payment provider secret key is not set",
            ));
        }

        let profile = self.profiles.find_by_user_id(&cmd.user_id).await?;
        let Some(customer_id) = profile.and_then(|p| p.stripe_customer_id) else {
            return Err(BillingError::customer_not_configured(cmd.user_id));
        };

        let flow_data = match cmd.flow {
            Some(flow) if flow.targets_subscription() => {
                // Free-plan users have no active provider subscription; the
                // portal still opens, just without the flow payload.
                match self
                    .payment_provider
                    .find_active_subscription(&customer_id)
                    .await?
                {
                    Some(subscription) => Some(PortalFlowData {
                        flow,
                        subscription_id: Some(subscription.id),
                    }),
                    None => {
                        tracing::info!(
                            user_id = %cmd.user_id,
                            flow = %flow,
                            "No active subscription for flow, issuing generic portal session"
                        );
                        None
                    }
                }
            }
            Some(flow) => Some(PortalFlowData {
                flow,
                subscription_id: None,
            }),
            None => None,
        };

        let return_url = cmd
            .return_url
            .unwrap_or_else(|| self.default_return_url.clone());

        let session = self
            .payment_provider
            .create_portal_session(CreatePortalRequest {
                customer_id: customer_id.clone(),
                return_url: return_url.clone(),
                configuration_id: cmd.configuration_id,
                flow_data: flow_data.clone(),
            })
            .await?;

        tracing::info!(
            user_id = %cmd.user_id,
            customer_id = %customer_id,
            flow = cmd.flow.map(|f| f.as_str()).unwrap_or("none"),
            with_flow_data = flow_data.is_some(),
            "Portal session issued"
        );

        let created = Timestamp::from_unix_secs(session.created);
        Ok(PortalIssued {
            url: session.url,
            created,
            expires_at: created.plus_secs(PORTAL_SESSION_TTL_SECS),
            flow: cmd.flow,
            return_url,
        })
    }
}
