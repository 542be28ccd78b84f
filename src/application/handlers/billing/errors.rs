//! Error type for client-initiated billing requests.

use thiserror::Error;

use crate::ports::{PaymentError, StoreError};

/// Errors from the request-path handlers (checkout, portal, status,
/// confirm). Webhook processing has its own taxonomy keyed to the
/// provider's redelivery behavior.
#[derive(Debug, Error)]
pub enum BillingRequestError {
    /// The request itself is unusable.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A referenced resource does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The payment provider call failed.
    #[error("Payment provider error: {0}")]
    Provider(#[from] PaymentError),

    /// The authoritative store failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}
