//! Payment provider configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Payment provider configuration (Stripe, plus App Store notification
/// verification)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Stripe secret API key
    #[serde(default = "empty_secret")]
    pub stripe_api_key: SecretString,

    /// Stripe webhook signing secret
    #[serde(default = "empty_secret")]
    pub stripe_webhook_secret: SecretString,

    /// Stripe price ID used for checkout sessions
    pub price_id: Option<String>,

    /// Public base URL for redirect construction (success/cancel/return)
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// Reject webhook events with livemode=false when running in production
    #[serde(default)]
    pub require_livemode: bool,

    /// PEM-encoded ES256 public key used to verify App Store signed payloads
    pub apple_signing_key_pem: Option<SecretString>,

    /// Expected bundle ID in App Store notifications
    pub apple_bundle_id: Option<String>,
}

impl PaymentConfig {
    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key.expose_secret().starts_with("sk_test_")
    }

    /// Check if using Stripe live mode
    pub fn is_live_mode(&self) -> bool {
        self.stripe_api_key.expose_secret().starts_with("sk_live_")
    }

    /// Check whether App Store notification verification is configured
    pub fn apple_configured(&self) -> bool {
        self.apple_signing_key_pem.is_some()
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let api_key = self.stripe_api_key.expose_secret();
        let webhook_secret = self.stripe_webhook_secret.expose_secret();

        if api_key.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_API_KEY"));
        }
        if webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_WEBHOOK_SECRET"));
        }

        // Verify key prefixes for safety
        if !api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if !webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }

        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            stripe_api_key: empty_secret(),
            stripe_webhook_secret: empty_secret(),
            price_id: None,
            public_base_url: default_public_base_url(),
            require_livemode: false,
            apple_signing_key_pem: None,
            apple_bundle_id: None,
        }
    }
}

// SecretString carries no Default of its own; absent values start empty
// and fail validation with MissingRequired
fn empty_secret() -> SecretString {
    SecretString::new(String::new())
}

fn default_public_base_url() -> String {
    "http://localhost:8080".to_string()
}
