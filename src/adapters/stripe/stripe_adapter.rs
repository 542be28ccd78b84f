//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` port against the Stripe REST API.
//! All calls are form-encoded with basic auth, per Stripe convention.
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(api_key);
//! let adapter = StripePaymentAdapter::new(config);
//! ```

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::ports::{
    CreateCheckoutRequest, CreateCustomerRequest, HostedSession, PaymentError, PaymentErrorCode,
    PaymentProvider, ProviderCheckoutSession, ProviderCustomer, ProviderSubscription,
};

use super::api_types::{
    StripeCheckoutSessionObject, StripeCustomer, StripeCustomerList, StripePortalSessionObject,
    StripeSubscriptionObject,
};

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Base URL for Stripe API (default: https://api.stripe.com).
    api_base_url: String,
}

impl StripeConfig {
    /// Create a new Stripe configuration.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
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

    fn api_key(&self) -> &str {
        self.config.api_key.expose_secret()
    }

    /// Maps a non-success Stripe response to a PaymentError.
    async fn error_from_response(
        &self,
        response: reqwest::Response,
        context: &'static str,
    ) -> PaymentError {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        tracing::error!(%status, error = %error_text, context, "Stripe API call failed");

        let code = match status {
            reqwest::StatusCode::NOT_FOUND => PaymentErrorCode::NotFound,
            reqwest::StatusCode::TOO_MANY_REQUESTS => PaymentErrorCode::RateLimitExceeded,
            reqwest::StatusCode::UNAUTHORIZED => PaymentErrorCode::AuthenticationError,
            _ => PaymentErrorCode::ProviderError,
        };

        PaymentError::new(code, format!("Stripe API error: {}", error_text))
    }

    fn parse_error(e: impl std::fmt::Display) -> PaymentError {
        PaymentError::new(
            PaymentErrorCode::ProviderError,
            format!("Failed to parse Stripe response: {}", e),
        )
    }
}

#[async_trait]
impl PaymentProvider for StripePaymentAdapter {
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<ProviderCustomer, PaymentError> {
        let url = format!("{}/v1/customers", self.config.api_base_url);

        let mut params = vec![("metadata[identity]", request.identity_key.clone())];
        if let Some(email) = &request.email {
            params.push(("email", email.clone()));
        }

        let response = self
            .http_client
            .post(&url)
            .basic_auth(self.api_key(), Option::<&str>::None)
            .form(&params)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(self.error_from_response(response, "create_customer").await);
        }

        let customer: StripeCustomer = response.json().await.map_err(Self::parse_error)?;

        tracing::info!(customer_id = %customer.id, "Created Stripe customer");

        Ok(ProviderCustomer {
            id: customer.id,
            email: customer.email.or(request.email),
        })
    }

    async fn get_customer(
        &self,
        customer_id: &str,
    ) -> Result<Option<ProviderCustomer>, PaymentError> {
        let url = format!("{}/v1/customers/{}", self.config.api_base_url, customer_id);

        let response = self
            .http_client
            .get(&url)
            .basic_auth(self.api_key(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(self.error_from_response(response, "get_customer").await);
        }

        let customer: StripeCustomer = response.json().await.map_err(Self::parse_error)?;

        // Deleted customers come back 200 with a stub object
        if customer.deleted {
            return Ok(None);
        }

        Ok(Some(ProviderCustomer {
            id: customer.id,
            email: customer.email,
        }))
    }

    async fn search_customer_by_email(
        &self,
        email: &str,
    ) -> Result<Option<ProviderCustomer>, PaymentError> {
        let url = format!("{}/v1/customers", self.config.api_base_url);

        let response = self
            .http_client
            .get(&url)
            .basic_auth(self.api_key(), Option::<&str>::None)
            .query(&[("email", email), ("limit", "1")])
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(self
                .error_from_response(response, "search_customer_by_email")
                .await);
        }

        let list: StripeCustomerList = response.json().await.map_err(Self::parse_error)?;

        Ok(list
            .data
            .into_iter()
            .find(|c| !c.deleted)
            .map(|c| ProviderCustomer {
                id: c.id,
                email: c.email,
            }))
    }

    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<ProviderSubscription>, PaymentError> {
        let url = format!(
            "{}/v1/subscriptions/{}",
            self.config.api_base_url, subscription_id
        );

        let response = self
            .http_client
            .get(&url)
            .basic_auth(self.api_key(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(self.error_from_response(response, "get_subscription").await);
        }

        let sub: StripeSubscriptionObject = response.json().await.map_err(Self::parse_error)?;

        Ok(Some(ProviderSubscription {
            id: sub.id,
            customer_id: sub.customer,
            status: sub.status,
            current_period_end: sub.current_period_end,
            cancel_at_period_end: sub.cancel_at_period_end,
        }))
    }

    async fn get_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<Option<ProviderCheckoutSession>, PaymentError> {
        let url = format!(
            "{}/v1/checkout/sessions/{}",
            self.config.api_base_url, session_id
        );

        let response = self
            .http_client
            .get(&url)
            .basic_auth(self.api_key(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(self
                .error_from_response(response, "get_checkout_session")
                .await);
        }

        let session: StripeCheckoutSessionObject =
            response.json().await.map_err(Self::parse_error)?;

        Ok(Some(ProviderCheckoutSession {
            id: session.id,
            customer: session.customer,
            subscription: session.subscription,
            client_reference_id: session.client_reference_id,
            customer_email: session.customer_email,
            payment_status: session.payment_status,
        }))
    }

    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<HostedSession, PaymentError> {
        let url = format!("{}/v1/checkout/sessions", self.config.api_base_url);

        let mut params = vec![
            ("mode", "subscription".to_string()),
            ("line_items[0][price]", request.price_id.clone()),
            ("line_items[0][quantity]", "1".to_string()),
            ("success_url", request.success_url.clone()),
            ("cancel_url", request.cancel_url.clone()),
        ];

        if let Some(customer_id) = &request.customer_id {
            params.push(("customer", customer_id.clone()));
        } else if let Some(email) = &request.email {
            params.push(("customer_email", email.clone()));
        }

        // The correlation token rides both the client reference and the
        // subscription metadata so every later event can resolve it.
        if let Some(token) = &request.correlation_token {
            params.push(("client_reference_id", token.clone()));
            params.push(("metadata[user_token]", token.clone()));
            params.push(("subscription_data[metadata][user_token]", token.clone()));
        }

        let response = self
            .http_client
            .post(&url)
            .basic_auth(self.api_key(), Option::<&str>::None)
            .form(&params)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(self
                .error_from_response(response, "create_checkout_session")
                .await);
        }

        let session: StripeCheckoutSessionObject =
            response.json().await.map_err(Self::parse_error)?;

        let redirect_url = session
            .url
            .ok_or_else(|| Self::parse_error("checkout session missing url"))?;

        Ok(HostedSession {
            id: session.id,
            url: redirect_url,
        })
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<HostedSession, PaymentError> {
        let url = format!("{}/v1/billing_portal/sessions", self.config.api_base_url);

        let response = self
            .http_client
            .post(&url)
            .basic_auth(self.api_key(), Option::<&str>::None)
            .form(&[("customer", customer_id), ("return_url", return_url)])
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(self
                .error_from_response(response, "create_portal_session")
                .await);
        }

        let portal: StripePortalSessionObject =
            response.json().await.map_err(Self::parse_error)?;

        Ok(HostedSession {
            id: portal.id,
            url: portal.url,
        })
    }
}
