//! App Store notification verifier port.
//!
//! Verification of the JWS payloads carried by App Store server
//! notifications. Pure computation, so the methods are synchronous.

use crate::domain::billing::{AppleNotificationPayload, AppleTransactionInfo, WebhookError};

/// Port for App Store signed payload verification.
pub trait AppleNotificationVerifier: Send + Sync {
    /// Verify and decode the outer `signedPayload` JWS.
    fn verify_notification(
        &self,
        signed_payload: &str,
    ) -> Result<AppleNotificationPayload, WebhookError>;

    /// Verify and decode the nested `signedTransactionInfo` JWS.
    fn verify_transaction(&self, jws: &str) -> Result<AppleTransactionInfo, WebhookError>;
}
