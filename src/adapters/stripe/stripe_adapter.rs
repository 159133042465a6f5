//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` port against the Stripe HTTP API using
//! form-encoded requests with basic auth. Subscription responses deserialize
//! straight into the domain's `SubscriptionSnapshot`, so provider API calls
//! and webhook payloads feed reconciliation through the same type.
//!
//! # Security
//!
//! Secrets are held in `secrecy::SecretString` and only exposed at the
//! request boundary. Webhook signature verification lives in the domain
//! (`WebhookVerifier`), not here.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::billing::SubscriptionSnapshot;
use crate::ports::{
    CreateCheckoutRequest, CreateCustomerRequest, CreatePortalRequest, Customer,
    HostedCheckoutSession, HostedPortalSession, PaymentError, PaymentProvider,
};

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    secret_key: SecretString,

    /// Base URL for the Stripe API.
    api_base_url: String,
}

impl StripeConfig {
    /// Create a new Stripe configuration.
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: SecretString::new(secret_key.into()),
            api_base_url: "https://api.stripe.com".to_string(),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// Stripe payment provider adapter.
pub struct StripePaymentAdapter {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripePaymentAdapter {
    /// Create a new Stripe adapter with the given configuration.
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, PaymentError> {
        let url = format!("{}{}", self.config.api_base_url, path);

        let response = self
            .http_client
            .post(&url)
            .basic_auth(self.config.secret_key.expose_secret(), Option::<&str>::None)
            .form(params)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        Self::parse_response(path, response).await
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, PaymentError> {
        let url = format!("{}{}", self.config.api_base_url, path);

        let response = self
            .http_client
            .get(&url)
            .basic_auth(self.config.secret_key.expose_secret(), Option::<&str>::None)
            .query(query)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        Self::parse_response(path, response).await
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        path: &str,
        response: reqwest::Response,
    ) -> Result<T, PaymentError> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(path, status = %status, error = %error_text, "Stripe API call failed");
            return Err(PaymentError::provider(format!(
                "Stripe API error ({}): {}",
                status, error_text
            )));
        }

        response.json().await.map_err(|e| {
            PaymentError::provider(format!("Failed to parse Stripe response: {}", e))
        })
    }
}

/// Stripe customer object (the fields we read back).
#[derive(Debug, Deserialize)]
struct StripeCustomerResponse {
    id: String,
    email: Option<String>,
    #[serde(default)]
    created: i64,
}

/// Stripe checkout session response.
#[derive(Debug, Deserialize)]
struct CheckoutSessionResponse {
    id: String,
    url: Option<String>,
}

/// Stripe billing portal session response.
#[derive(Debug, Deserialize)]
struct PortalSessionResponse {
    id: String,
    url: String,
    #[serde(default)]
    created: i64,
}

/// Stripe list envelope.
#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default)]
    data: Vec<T>,
}

#[async_trait]
impl PaymentProvider for StripePaymentAdapter {
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, PaymentError> {
        let params = vec![
            ("email".to_string(), request.email.clone()),
            ("metadata[user_id]".to_string(), request.user_id.to_string()),
        ];

        let customer: StripeCustomerResponse = self.post_form("/v1/customers", &params).await?;

        tracing::info!(
            customer_id = %customer.id,
            user_id = %request.user_id,
            "Stripe customer created"
        );

        Ok(Customer {
            id: customer.id,
            email: customer.email.or(Some(request.email)),
            created: customer.created,
        })
    }

    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<HostedCheckoutSession, PaymentError> {
        let mut params = vec![
            ("mode".to_string(), "subscription".to_string()),
            ("customer".to_string(), request.customer_id.clone()),
            ("line_items[0][price]".to_string(), request.price_id.clone()),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("success_url".to_string(), request.success_url.clone()),
            ("cancel_url".to_string(), request.cancel_url.clone()),
        ];
        for (key, value) in &request.metadata {
            params.push((format!("metadata[{}]", key), value.clone()));
        }

        let session: CheckoutSessionResponse =
            self.post_form("/v1/checkout/sessions", &params).await?;

        let url = session
            .url
            .unwrap_or_else(|| format!("https://checkout.stripe.com/c/pay/{}", session.id));

        Ok(HostedCheckoutSession {
            id: session.id,
            url,
        })
    }

    async fn create_portal_session(
        &self,
        request: CreatePortalRequest,
    ) -> Result<HostedPortalSession, PaymentError> {
        let mut params = vec![
            ("customer".to_string(), request.customer_id.clone()),
            ("return_url".to_string(), request.return_url.clone()),
        ];

        if let Some(configuration_id) = &request.configuration_id {
            params.push(("configuration".to_string(), configuration_id.clone()));
        }

        if let Some(flow_data) = &request.flow_data {
            params.push(("flow_data[type]".to_string(), flow_data.flow.to_string()));
            if let Some(subscription_id) = &flow_data.subscription_id {
                params.push((
                    format!("flow_data[{}][subscription]", flow_data.flow),
                    subscription_id.clone(),
                ));
            }
        }

        let session: PortalSessionResponse = self
            .post_form("/v1/billing_portal/sessions", &params)
            .await?;

        Ok(HostedPortalSession {
            id: session.id,
            url: session.url,
            created: session.created,
        })
    }

    async fn find_active_subscription(
        &self,
        customer_id: &str,
    ) -> Result<Option<SubscriptionSnapshot>, PaymentError> {
        let list: ListResponse<SubscriptionSnapshot> = self
            .get(
                "/v1/subscriptions",
                &[
                    ("customer", customer_id),
                    ("status", "active"),
                    ("limit", "1"),
                ],
            )
            .await?;

        Ok(list.data.into_iter().next())
    }

    async fn set_cancel_at_period_end(
        &self,
        subscription_id: &str,
        cancel: bool,
    ) -> Result<SubscriptionSnapshot, PaymentError> {
        let params = vec![(
            "cancel_at_period_end".to_string(),
            cancel.to_string(),
        )];

        self.post_form(&format!("/v1/subscriptions/{}", subscription_id), &params)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_stripe_api() {
        let config = StripeConfig::new("sk_test_key");
        assert_eq!(config.api_base_url, "https://api.stripe.com");
    }

    #[test]
    fn config_with_base_url_overrides() {
        let config = StripeConfig::new("sk_test_key").with_base_url("http://localhost:12111");
        assert_eq!(config.api_base_url, "http://localhost:12111");
    }

    #[test]
    fn checkout_session_response_parses_with_and_without_url() {
        let with_url: CheckoutSessionResponse = serde_json::from_str(
            r#"{"id": "cs_1", "url": "https://checkout.stripe.com/c/pay/cs_1"}"#,
        )
        .unwrap();
        assert!(with_url.url.is_some());

        let without_url: CheckoutSessionResponse =
            serde_json::from_str(r#"{"id": "cs_2", "url": null}"#).unwrap();
        assert!(without_url.url.is_none());
    }

    #[test]
    fn subscription_list_response_parses_into_snapshots() {
        let json = r#"{
            "object": "list",
            "data": [{
                "id": "sub_1",
                "customer": "cus_1",
                "status": "active",
                "current_period_start": 1704067200,
                "current_period_end": 1706745600,
                "items": {"data": [{"price": {
                    "id": "price_pro_month",
                    "product": "prod_pro",
                    "recurring": {"interval": "month"}
                }}]}
            }]
        }"#;

        let list: ListResponse<SubscriptionSnapshot> = serde_json::from_str(json).unwrap();
        assert_eq!(list.data.len(), 1);
        assert_eq!(list.data[0].id, "sub_1");
        assert_eq!(list.data[0].primary_price().unwrap().id, "price_pro_month");
    }

    #[test]
    fn empty_subscription_list_parses() {
        let list: ListResponse<SubscriptionSnapshot> =
            serde_json::from_str(r#"{"object": "list", "data": []}"#).unwrap();
        assert!(list.data.is_empty());
    }
}
