//! Webhook error taxonomy.
//!
//! Error conditions during webhook processing, with HTTP status code
//! mapping and retryability semantics. The status code is what drives the
//! provider's redelivery behavior: 2xx acknowledges, 4xx stops retries,
//! 5xx triggers redelivery.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Webhook signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Webhook timestamp is outside the acceptable window (5 minutes).
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Event timestamp is in the future beyond clock skew tolerance.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Failed to parse webhook payload or signature header.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Required field missing from webhook payload.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// No identity could be resolved for the event. Acknowledged as
    /// success so the provider does not endlessly retry.
    #[error("No identity resolved for event")]
    UnresolvedIdentity,

    /// Event was intentionally ignored (not an error condition).
    #[error("Event ignored: {0}")]
    Ignored(String),

    /// A provider API call failed mid-dispatch (timeout, rate limit,
    /// not-found). Surfaced as 500 so the provider redelivers.
    #[error("Provider API error: {0}")]
    ProviderApi(String),

    /// Signed-payload verification is not configured for this endpoint.
    #[error("Verification key not configured")]
    VerificationUnavailable,
}

impl WebhookError {
    /// Returns true if the provider should retry delivering this webhook.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::ProviderApi(_))
    }

    /// Maps the error to an appropriate HTTP status code.
    ///
    /// - 2xx: Event acknowledged, no retry
    /// - 4xx: Client error, no retry
    /// - 5xx: Server error, provider will retry
    pub fn status_code(&self) -> StatusCode {
        match self {
            // Auth failures - don't retry
            WebhookError::InvalidSignature | WebhookError::TimestampOutOfRange => {
                StatusCode::UNAUTHORIZED
            }

            // Bad request - don't retry
            WebhookError::InvalidTimestamp
            | WebhookError::ParseError(_)
            | WebhookError::MissingField(_)
            | WebhookError::VerificationUnavailable => StatusCode::BAD_REQUEST,

            // Benign drops are acknowledged as success
            WebhookError::UnresolvedIdentity | WebhookError::Ignored(_) => StatusCode::OK,

            // Server errors - provider redelivers
            WebhookError::ProviderApi(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
