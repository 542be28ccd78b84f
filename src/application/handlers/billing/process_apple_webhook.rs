//! ProcessAppleWebhookHandler - Command handler for App Store server notifications.
//!
//! Verifies the outer signed payload and the nested transaction JWS,
//! correlates the app account token to an identity, and applies the
//! translated status through the same dual-write path the web events use.

use std::sync::Arc;

use crate::domain::billing::{
    translate_apple_status, AppleNotificationPayload, AppleTransactionInfo, Platform, RecordPatch,
    UserIdentity, WebhookError,
};
use crate::ports::{AppleNotificationVerifier, SnapshotCache, UserRecordStore};

use super::process_webhook::ProcessWebhookResult;
use super::record_writer::RecordWriter;

/// Command to process an App Store server notification.
#[derive(Debug, Clone)]
pub struct ProcessAppleWebhookCommand {
    /// The `signedPayload` JWS from the request body.
    pub signed_payload: String,
}

/// Handler for App Store server notifications.
pub struct ProcessAppleWebhookHandler {
    verifier: Option<Arc<dyn AppleNotificationVerifier>>,
    writer: RecordWriter,
}

impl ProcessAppleWebhookHandler {
    /// `verifier` is None when no verification key is configured; the
    /// endpoint then rejects every delivery rather than trusting claims.
    pub fn new(
        verifier: Option<Arc<dyn AppleNotificationVerifier>>,
        store: Arc<dyn UserRecordStore>,
        cache: Arc<dyn SnapshotCache>,
    ) -> Self {
        Self {
            verifier,
            writer: RecordWriter::new(store, cache),
        }
    }

    pub async fn handle(
        &self,
        cmd: ProcessAppleWebhookCommand,
    ) -> Result<ProcessWebhookResult, WebhookError> {
        let verifier = self
            .verifier
            .as_ref()
            .ok_or(WebhookError::VerificationUnavailable)?;

        let notification = verifier.verify_notification(&cmd.signed_payload)?;

        tracing::info!(
            notification_type = %notification.notification_type,
            subtype = ?notification.subtype,
            notification_uuid = ?notification.notification_uuid,
            "App Store notification received"
        );

        let transaction = match &notification.data.signed_transaction_info {
            Some(jws) => verifier.verify_transaction(jws)?,
            None => {
                // Without transaction info there is nothing to correlate
                tracing::info!(
                    notification_type = %notification.notification_type,
                    "Notification carries no transaction info, dropped"
                );
                return Err(WebhookError::UnresolvedIdentity);
            }
        };

        let identity = match &transaction.app_account_token {
            Some(token) if !token.trim().is_empty() => UserIdentity::external_token(token),
            _ => {
                tracing::info!(
                    notification_type = %notification.notification_type,
                    original_transaction_id = ?transaction.original_transaction_id,
                    "Transaction has no app account token, dropped"
                );
                return Err(WebhookError::UnresolvedIdentity);
            }
        };

        let status_code = Self::status_code(&notification);
        let translated = translate_apple_status(status_code, transaction.expires_date);

        let patch = RecordPatch {
            is_premium: Some(translated.is_premium),
            current_period_end: Some(translated.current_period_end),
            provider_subscription_id: Some(transaction.original_transaction_id.clone()),
            platform: Some(Platform::AppleIap),
            ..Default::default()
        };

        self.writer.apply(&identity, &patch).await;
        Ok(ProcessWebhookResult::Applied { identity })
    }

    /// The `data.status` code when present, otherwise a mapping from the
    /// notification type. Unmapped types come out as 0 and translate to
    /// non-premium.
    fn status_code(notification: &AppleNotificationPayload) -> i64 {
        if let Some(status) = notification.data.status {
            return status;
        }
        match notification.notification_type.as_str() {
            "SUBSCRIBED" | "DID_RENEW" | "DID_CHANGE_RENEWAL_STATUS" => 1,
            "EXPIRED" | "GRACE_PERIOD_EXPIRED" => 2,
            "DID_FAIL_TO_RENEW" => 3,
            "REVOKE" | "REFUND" => 5,
            _ => 0,
        }
    }

    #[cfg(test)]
    fn status_code_for_test(notification: &AppleNotificationPayload) -> i64 {
        Self::status_code(notification)
    }
}
