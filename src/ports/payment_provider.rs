//! Payment provider port for external payment processing.
//!
//! Contract for the billing provider integration (Stripe in production).
//! Covers customer management, subscription retrieval, and hosted
//! checkout/portal session creation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::billing::WebhookError;

/// Port for payment provider integrations.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a customer in the payment system.
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<ProviderCustomer, PaymentError>;

    /// Get customer by provider ID. `Ok(None)` when the customer does not
    /// exist or has been deleted provider-side.
    async fn get_customer(
        &self,
        customer_id: &str,
    ) -> Result<Option<ProviderCustomer>, PaymentError>;

    /// Search for an existing customer by email address.
    async fn search_customer_by_email(
        &self,
        email: &str,
    ) -> Result<Option<ProviderCustomer>, PaymentError>;

    /// Get subscription by provider ID.
    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<ProviderSubscription>, PaymentError>;

    /// Retrieve a checkout session by ID (confirm-session fallback path).
    async fn get_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<Option<ProviderCheckoutSession>, PaymentError>;

    /// Create a hosted checkout session; returns the redirect URL.
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<HostedSession, PaymentError>;

    /// Create a billing portal session; returns the redirect URL.
    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<HostedSession, PaymentError>;
}

/// Request to create a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCustomerRequest {
    /// Customer email address, if known.
    pub email: Option<String>,

    /// Internal identity key, stored as provider metadata.
    pub identity_key: String,
}

/// Customer in the payment system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCustomer {
    /// Provider's customer ID (cus_...).
    pub id: String,

    /// Customer email.
    pub email: Option<String>,
}

/// Subscription in the payment system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSubscription {
    /// Provider's subscription ID (sub_...).
    pub id: String,

    /// Owning customer ID.
    pub customer_id: String,

    /// Provider-native status string, fed to the status translator.
    pub status: String,

    /// Current billing period end (Unix timestamp).
    pub current_period_end: Option<i64>,

    /// Whether the subscription cancels at period end.
    pub cancel_at_period_end: bool,
}

/// Checkout session as retrieved from the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCheckoutSession {
    /// Provider's session ID (cs_...).
    pub id: String,

    /// Associated customer, if any.
    pub customer: Option<String>,

    /// Subscription created by the session, if any.
    pub subscription: Option<String>,

    /// Correlation token echoed back unchanged.
    pub client_reference_id: Option<String>,

    /// Email collected at checkout.
    pub customer_email: Option<String>,

    /// Payment status ("paid", "unpaid", "no_payment_required").
    pub payment_status: Option<String>,
}

/// Request to create a checkout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCheckoutRequest {
    /// Existing provider customer to attach, if provisioned.
    pub customer_id: Option<String>,

    /// Email for pre-fill when no customer exists yet.
    pub email: Option<String>,

    /// Correlation token attached as the client reference and metadata.
    pub correlation_token: Option<String>,

    /// Price to subscribe to.
    pub price_id: String,

    /// URL to redirect after successful checkout.
    pub success_url: String,

    /// URL to redirect after canceled checkout.
    pub cancel_url: String,
}

/// Hosted session (checkout or billing portal).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostedSession {
    /// Provider's session ID.
    pub id: String,

    /// URL for the customer's browser.
    pub url: String,
}

/// Errors from payment provider operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentError {
    /// Error code for categorization.
    pub code: PaymentErrorCode,

    /// Human-readable message.
    pub message: String,

    /// Provider's error code (if available).
    pub provider_code: Option<String>,

    /// Whether the operation can be retried.
    pub retryable: bool,
}

impl PaymentError {
    /// Create a new payment error.
    pub fn new(code: PaymentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    /// Create with provider code.
    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::NetworkError, message)
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::AuthenticationError, message)
    }

    /// Create a not found error.
    pub fn not_found(resource: &str) -> Self {
        Self::new(PaymentErrorCode::NotFound, format!("{} not found", resource))
    }

    /// True when the provider reports the resource as missing or deleted.
    pub fn is_not_found(&self) -> bool {
        self.code == PaymentErrorCode::NotFound
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PaymentError {}

impl From<PaymentError> for WebhookError {
    fn from(err: PaymentError) -> Self {
        WebhookError::ProviderApi(err.to_string())
    }
}

/// Payment error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentErrorCode {
    /// Network connectivity issue.
    NetworkError,

    /// API authentication failed.
    AuthenticationError,

    /// Resource not found.
    NotFound,

    /// Rate limit exceeded.
    RateLimitExceeded,

    /// Provider API error.
    ProviderError,

    /// Unknown error.
    Unknown,
}

impl PaymentErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentErrorCode::NetworkError | PaymentErrorCode::RateLimitExceeded
        )
    }
}

impl std::fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentErrorCode::NetworkError => "network_error",
            PaymentErrorCode::AuthenticationError => "authentication_error",
            PaymentErrorCode::NotFound => "not_found",
            PaymentErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            PaymentErrorCode::ProviderError => "provider_error",
            PaymentErrorCode::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Trait object safety test
    #[test]
    fn payment_provider_is_object_safe() {
        fn _accepts_dyn(_provider: &dyn PaymentProvider) {}
    }

    #[test]
    fn payment_error_retryable() {
        assert!(PaymentErrorCode::NetworkError.is_retryable());
        assert!(PaymentErrorCode::RateLimitExceeded.is_retryable());

        assert!(!PaymentErrorCode::NotFound.is_retryable());
        assert!(!PaymentErrorCode::ProviderError.is_retryable());
    }

    #[test]
    fn payment_error_display() {
        let err = PaymentError::not_found("customer");
        assert!(err.to_string().contains("not_found"));
        assert!(err.to_string().contains("customer not found"));
    }

    #[test]
    fn not_found_is_detectable() {
        assert!(PaymentError::not_found("customer").is_not_found());
        assert!(!PaymentError::network("timeout").is_not_found());
    }

    #[test]
    fn payment_error_converts_to_webhook_error() {
        let err: WebhookError = PaymentError::network("timeout").into();
        assert!(matches!(err, WebhookError::ProviderApi(_)));
        assert!(err.is_retryable());
    }
}
