//! ProcessWebhookHandler - Command handler for provider webhook events.
//!
//! The single entry point for Stripe-delivered events: verifies the
//! signature over the raw bytes, resolves an identity, translates the
//! provider status, and applies the resulting patch through the
//! dual-write path.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::domain::billing::{
    translate_status, CheckoutSessionPayload, EventPayload, InvoicePayload, Platform, RecordPatch,
    ResolvedIdentity, StripeEvent, SubscriptionPayload, UserIdentity, WebhookError,
    WebhookVerifier,
};
use crate::ports::{PaymentProvider, SnapshotCache, UserRecordStore};

use super::identity_resolver::IdentityResolver;
use super::record_writer::RecordWriter;

/// Days a payment failure keeps access alive before a definitive event.
const GRACE_WINDOW_DAYS: i64 = 3;

/// Command to process a provider webhook delivery.
#[derive(Debug, Clone)]
pub struct ProcessWebhookCommand {
    /// Raw request body, exactly as received.
    pub payload: Vec<u8>,
    /// Signature header value.
    pub signature: String,
}

/// Result of webhook processing.
#[derive(Debug, Clone)]
pub enum ProcessWebhookResult {
    /// A record patch was applied for the identity.
    Applied { identity: UserIdentity },
    /// Event acknowledged without record changes.
    Acknowledged,
}

/// Handler for Stripe webhook events.
pub struct ProcessWebhookHandler {
    verifier: WebhookVerifier,
    provider: Arc<dyn PaymentProvider>,
    resolver: IdentityResolver,
    writer: RecordWriter,
    require_livemode: bool,
}

impl ProcessWebhookHandler {
    pub fn new(
        verifier: WebhookVerifier,
        provider: Arc<dyn PaymentProvider>,
        store: Arc<dyn UserRecordStore>,
        cache: Arc<dyn SnapshotCache>,
        require_livemode: bool,
    ) -> Self {
        Self {
            verifier,
            provider,
            resolver: IdentityResolver::new(store.clone()),
            writer: RecordWriter::new(store, cache),
            require_livemode,
        }
    }

    pub async fn handle(
        &self,
        cmd: ProcessWebhookCommand,
    ) -> Result<ProcessWebhookResult, WebhookError> {
        // Authentication gate: nothing below runs without a valid signature
        let event = self.verifier.verify_and_parse(&cmd.payload, &cmd.signature)?;

        tracing::info!(
            event_id = %event.id,
            event_type = %event.event_type,
            livemode = event.is_live(),
            "Webhook event received"
        );

        if self.require_livemode && !event.is_live() {
            return Err(WebhookError::Ignored("test mode event rejected".to_string()));
        }

        match event.payload()? {
            EventPayload::CheckoutCompleted(session) => {
                self.handle_checkout_completed(&event, session).await
            }
            EventPayload::SubscriptionCreated(sub) | EventPayload::SubscriptionUpdated(sub) => {
                self.handle_subscription_changed(&event, sub).await
            }
            EventPayload::SubscriptionDeleted(sub) => {
                self.handle_subscription_deleted(&event, sub).await
            }
            EventPayload::InvoicePaymentFailed(invoice) => {
                self.handle_invoice_payment_failed(&event, invoice).await
            }
            EventPayload::Other { event_type } => {
                tracing::debug!(event_id = %event.id, event_type, "Unhandled event type acknowledged");
                Ok(ProcessWebhookResult::Acknowledged)
            }
        }
    }

    async fn resolve_or_drop(
        &self,
        event_id: &str,
        token: Option<&str>,
        email: Option<&str>,
        customer_id: Option<&str>,
    ) -> Result<UserIdentity, WebhookError> {
        match self.resolver.resolve(token, email, customer_id).await {
            ResolvedIdentity::Known(identity) => Ok(identity),
            ResolvedIdentity::Unresolved => {
                tracing::info!(event_id, "No identity resolved, event dropped");
                Err(WebhookError::UnresolvedIdentity)
            }
        }
    }

    async fn handle_checkout_completed(
        &self,
        event: &StripeEvent,
        session: CheckoutSessionPayload,
    ) -> Result<ProcessWebhookResult, WebhookError> {
        let identity = self
            .resolve_or_drop(
                &event.id,
                session.correlation_token(),
                session.email(),
                session.customer.as_deref(),
            )
            .await?;

        let mut patch = RecordPatch::default();
        if let Some(customer) = &session.customer {
            patch.provider_customer_id = Some(Some(customer.clone()));
        }

        if let Some(subscription_id) = &session.subscription {
            // The session object carries no status; fetch the live
            // subscription and translate from that
            match self.provider.get_subscription(subscription_id).await? {
                Some(sub) => {
                    let translated = translate_status(&sub.status, sub.current_period_end);
                    patch.is_premium = Some(translated.is_premium);
                    patch.current_period_end = Some(translated.current_period_end);
                    patch.provider_subscription_id = Some(Some(sub.id));
                    patch.platform = Some(Platform::Web);
                }
                None => {
                    tracing::warn!(
                        event_id = %event.id,
                        subscription_id,
                        "Checkout references a subscription the provider no longer has"
                    );
                }
            }
        }

        self.writer.apply(&identity, &patch).await;
        Ok(ProcessWebhookResult::Applied { identity })
    }

    async fn handle_subscription_changed(
        &self,
        event: &StripeEvent,
        sub: SubscriptionPayload,
    ) -> Result<ProcessWebhookResult, WebhookError> {
        let identity = self
            .resolve_or_drop(&event.id, sub.correlation_token(), None, Some(&sub.customer))
            .await?;

        let translated = translate_status(&sub.status, sub.current_period_end);

        let patch = RecordPatch {
            is_premium: Some(translated.is_premium),
            current_period_end: Some(translated.current_period_end),
            provider_customer_id: Some(Some(sub.customer.clone())),
            provider_subscription_id: Some(Some(sub.id.clone())),
            platform: Some(Platform::Web),
            ..Default::default()
        };

        self.writer.apply(&identity, &patch).await;
        Ok(ProcessWebhookResult::Applied { identity })
    }

    async fn handle_subscription_deleted(
        &self,
        event: &StripeEvent,
        sub: SubscriptionPayload,
    ) -> Result<ProcessWebhookResult, WebhookError> {
        let identity = self
            .resolve_or_drop(&event.id, sub.correlation_token(), None, Some(&sub.customer))
            .await?;

        // Deletion is definitive: any open grace window ends with it
        let mut patch = RecordPatch::subscription_cleared();
        patch.grace_until = Some(None);

        self.writer.apply(&identity, &patch).await;
        Ok(ProcessWebhookResult::Applied { identity })
    }

    async fn handle_invoice_payment_failed(
        &self,
        event: &StripeEvent,
        invoice: InvoicePayload,
    ) -> Result<ProcessWebhookResult, WebhookError> {
        let identity = self
            .resolve_or_drop(
                &event.id,
                None,
                invoice.customer_email.as_deref(),
                invoice.customer.as_deref(),
            )
            .await?;

        // Premium stays as-is until a definitive subscription event;
        // the deadline only bounds how long that tolerance lasts
        let grace_until = Utc::now() + Duration::days(GRACE_WINDOW_DAYS);
        tracing::info!(
            event_id = %event.id,
            identity = %identity,
            attempt_count = invoice.attempt_count,
            %grace_until,
            "Payment failed, grace window set"
        );

        self.writer.apply(&identity, &RecordPatch::grace(grace_until)).await;
        Ok(ProcessWebhookResult::Applied { identity })
    }
}
