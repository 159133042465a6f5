//! Payment configuration (Stripe)

use serde::Deserialize;

use super::error::ValidationError;

/// Payment configuration.
///
/// Secrets may legitimately be absent (e.g. a preview environment): the
/// service still boots and each billing request fails with a configuration
/// error instead. Validation only rejects values that are present but
/// malformed.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Stripe secret API key (sk_...)
    #[serde(default)]
    pub stripe_secret_key: String,

    /// Stripe webhook signing secret (whsec_...)
    #[serde(default)]
    pub stripe_webhook_secret: String,

    /// Stripe publishable key, served to the client
    #[serde(default)]
    pub stripe_publishable_key: String,

    /// Redirect after successful checkout
    #[serde(default = "default_success_url")]
    pub checkout_success_url: String,

    /// Redirect after abandoned checkout
    #[serde(default = "default_cancel_url")]
    pub checkout_cancel_url: String,

    /// Default return URL for billing portal sessions
    #[serde(default = "default_portal_return_url")]
    pub portal_return_url: String,
}

impl PaymentConfig {
    /// Whether the secret API key is present.
    pub fn has_secret_key(&self) -> bool {
        !self.stripe_secret_key.is_empty()
    }

    /// Whether the webhook signing secret is present.
    pub fn has_webhook_secret(&self) -> bool {
        !self.stripe_webhook_secret.is_empty()
    }

    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.stripe_secret_key.starts_with("sk_test_")
    }

    /// Check if using Stripe live mode
    pub fn is_live_mode(&self) -> bool {
        self.stripe_secret_key.starts_with("sk_live_")
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        // Verify key prefixes for safety when the keys are set
        if self.has_secret_key() && !self.stripe_secret_key.starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if self.has_webhook_secret() && !self.stripe_webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }

        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            stripe_secret_key: String::new(),
            stripe_webhook_secret: String::new(),
            stripe_publishable_key: String::new(),
            checkout_success_url: default_success_url(),
            checkout_cancel_url: default_cancel_url(),
            portal_return_url: default_portal_return_url(),
        }
    }
}

fn default_success_url() -> String {
    "http://localhost:3000/billing/success".to_string()
}

fn default_cancel_url() -> String {
    "http://localhost:3000/billing/cancel".to_string()
}

fn default_portal_return_url() -> String {
    "http://localhost:3000/billing".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_test_mode() {
        let config = PaymentConfig {
            stripe_secret_key: "sk_test_xxx".to_string(),
            stripe_webhook_secret: "whsec_xxx".to_string(),
            ..Default::default()
        };
        assert!(config.is_test_mode());
        assert!(!config.is_live_mode());
    }

    #[test]
    fn test_is_live_mode() {
        let config = PaymentConfig {
            stripe_secret_key: "sk_live_xxx".to_string(),
            stripe_webhook_secret: "whsec_xxx".to_string(),
            ..Default::default()
        };
        assert!(config.is_live_mode());
        assert!(!config.is_test_mode());
    }

    #[test]
    fn missing_secrets_still_validate() {
        let config = PaymentConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.has_secret_key());
        assert!(!config.has_webhook_secret());
    }

    #[test]
    fn test_validation_invalid_api_key_prefix() {
        let config = PaymentConfig {
            stripe_secret_key: "pk_test_xxx".to_string(), // Wrong prefix
            stripe_webhook_secret: "whsec_xxx".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_webhook_secret_prefix() {
        let config = PaymentConfig {
            stripe_secret_key: "sk_test_xxx".to_string(),
            stripe_webhook_secret: "secret_xxx".to_string(), // Wrong prefix
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_valid_config() {
        let config = PaymentConfig {
            stripe_secret_key: "sk_test_abcd1234".to_string(),
            stripe_webhook_secret: "whsec_xyz789".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_urls_are_set() {
        let config = PaymentConfig::default();
        assert!(config.checkout_success_url.contains("/billing/success"));
        assert!(config.portal_return_url.contains("/billing"));
    }
}
