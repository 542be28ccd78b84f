//! ConfirmSessionHandler - Command handler for the post-checkout redirect.
//!
//! The success page calls this with the session id the provider
//! substituted into the redirect URL. It pulls the session back from the
//! provider and applies the same patch the checkout webhook would, so
//! the user sees premium immediately even when the webhook is delayed.

use std::sync::Arc;

use crate::domain::billing::{translate_status, Platform, RecordPatch, UserIdentity};
use crate::ports::{PaymentProvider, SnapshotCache, UserRecordStore};

use super::errors::BillingRequestError;
use super::identity_resolver::IdentityResolver;
use super::record_writer::RecordWriter;

/// Command to confirm a completed checkout session.
#[derive(Debug, Clone)]
pub struct ConfirmSessionCommand {
    /// Provider session id from the success redirect.
    pub session_id: String,
    /// Optional raw identity supplied by the caller; otherwise the
    /// session's own correlation data is used.
    pub identity: Option<String>,
}

/// Result of confirming a session.
#[derive(Debug, Clone)]
pub struct ConfirmSessionResult {
    pub identity: UserIdentity,
    pub is_premium: bool,
}

/// Handler for confirming checkout sessions.
pub struct ConfirmSessionHandler {
    provider: Arc<dyn PaymentProvider>,
    resolver: IdentityResolver,
    writer: RecordWriter,
}

impl ConfirmSessionHandler {
    pub fn new(
        provider: Arc<dyn PaymentProvider>,
        store: Arc<dyn UserRecordStore>,
        cache: Arc<dyn SnapshotCache>,
    ) -> Self {
        Self {
            provider,
            resolver: IdentityResolver::new(store.clone()),
            writer: RecordWriter::new(store, cache),
        }
    }

    pub async fn handle(
        &self,
        cmd: ConfirmSessionCommand,
    ) -> Result<ConfirmSessionResult, BillingRequestError> {
        let session = self
            .provider
            .get_checkout_session(&cmd.session_id)
            .await?
            .ok_or(BillingRequestError::NotFound("checkout session"))?;

        let identity = match cmd.identity.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => UserIdentity::parse(raw),
            None => self
                .resolver
                .resolve(
                    session.client_reference_id.as_deref(),
                    session.customer_email.as_deref(),
                    session.customer.as_deref(),
                )
                .await
                .known()
                .ok_or_else(|| {
                    BillingRequestError::InvalidRequest(
                        "Session carries no resolvable identity".to_string(),
                    )
                })?,
        };

        let mut patch = RecordPatch::default();
        if let Some(customer) = &session.customer {
            patch.provider_customer_id = Some(Some(customer.clone()));
        }

        let mut is_premium = false;
        if let Some(subscription_id) = &session.subscription {
            if let Some(sub) = self.provider.get_subscription(subscription_id).await? {
                let translated = translate_status(&sub.status, sub.current_period_end);
                is_premium = translated.is_premium;
                patch.is_premium = Some(translated.is_premium);
                patch.current_period_end = Some(translated.current_period_end);
                patch.provider_subscription_id = Some(Some(sub.id));
                patch.platform = Some(Platform::Web);
            }
        }

        tracing::info!(
            session_id = %cmd.session_id,
            identity = %identity,
            is_premium,
            "Checkout session confirmed"
        );
        self.writer.apply(&identity, &patch).await;

        Ok(ConfirmSessionResult {
            identity,
            is_premium,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::billing::test_support::{
        MockPaymentProvider, MockRecordStore, MockSnapshotCache,
    };
    use crate::ports::{ProviderCheckoutSession, ProviderSubscription};

    fn paid_session(session_id: &str) -> ProviderCheckoutSession {
        ProviderCheckoutSession {
            id: session_id.to_string(),
            customer: Some("cus_1".to_string()),
            subscription: Some("sub_1".to_string()),
            client_reference_id: Some("app-user-42".to_string()),
            customer_email: None,
            payment_status: Some("paid".to_string()),
        }
    }

    fn active_subscription() -> ProviderSubscription {
        ProviderSubscription {
            id: "sub_1".to_string(),
            customer_id: "cus_1".to_string(),
            status: "active".to_string(),
            current_period_end: Some(1_798_761_600),
            cancel_at_period_end: false,
        }
    }

    fn handler(
        provider: Arc<MockPaymentProvider>,
        store: Arc<MockRecordStore>,
        cache: Arc<MockSnapshotCache>,
    ) -> ConfirmSessionHandler {
        ConfirmSessionHandler::new(provider, store, cache)
    }

    #[tokio::test]
    async fn confirms_paid_session_and_grants_premium() {
        let provider = Arc::new(MockPaymentProvider::with_checkout_session(paid_session(
            "cs_1",
        )));
        provider.add_subscription(active_subscription());
        let store = Arc::new(MockRecordStore::new());
        let cache = Arc::new(MockSnapshotCache::new());
        let h = handler(provider, store, cache.clone());

        let result = h
            .handle(ConfirmSessionCommand {
                session_id: "cs_1".to_string(),
                identity: None,
            })
            .await
            .unwrap();

        assert!(result.is_premium);
        assert_eq!(result.identity, UserIdentity::external_token("app-user-42"));
        let snapshot = cache.snapshot();
        assert!(snapshot["app-user-42"].is_premium);
        assert_eq!(
            snapshot["app-user-42"].provider_customer_id.as_deref(),
            Some("cus_1")
        );
    }

    #[tokio::test]
    async fn explicit_identity_overrides_session_correlation() {
        let provider = Arc::new(MockPaymentProvider::with_checkout_session(paid_session(
            "cs_1",
        )));
        provider.add_subscription(active_subscription());
        let store = Arc::new(MockRecordStore::new());
        let cache = Arc::new(MockSnapshotCache::new());
        let h = handler(provider, store, cache.clone());

        let result = h
            .handle(ConfirmSessionCommand {
                session_id: "cs_1".to_string(),
                identity: Some("user@example.com".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(result.identity, UserIdentity::email("user@example.com"));
        assert!(cache.snapshot().contains_key("user@example.com"));
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let provider = Arc::new(MockPaymentProvider::new());
        let store = Arc::new(MockRecordStore::new());
        let cache = Arc::new(MockSnapshotCache::new());
        let h = handler(provider, store, cache.clone());

        let result = h
            .handle(ConfirmSessionCommand {
                session_id: "cs_missing".to_string(),
                identity: None,
            })
            .await;

        assert!(matches!(result, Err(BillingRequestError::NotFound(_))));
        assert_eq!(cache.write_count(), 0);
    }

    #[tokio::test]
    async fn session_without_identity_is_rejected() {
        let mut session = paid_session("cs_1");
        session.client_reference_id = None;
        session.customer = None;
        session.customer_email = None;
        let provider = Arc::new(MockPaymentProvider::with_checkout_session(session));
        let store = Arc::new(MockRecordStore::new());
        let cache = Arc::new(MockSnapshotCache::new());
        let h = handler(provider, store, cache.clone());

        let result = h
            .handle(ConfirmSessionCommand {
                session_id: "cs_1".to_string(),
                identity: None,
            })
            .await;

        assert!(matches!(result, Err(BillingRequestError::InvalidRequest(_))));
        assert_eq!(cache.write_count(), 0);
    }

    #[tokio::test]
    async fn session_without_subscription_links_customer_only() {
        let mut session = paid_session("cs_1");
        session.subscription = None;
        let provider = Arc::new(MockPaymentProvider::with_checkout_session(session));
        let store = Arc::new(MockRecordStore::new());
        let cache = Arc::new(MockSnapshotCache::new());
        let h = handler(provider, store, cache.clone());

        let result = h
            .handle(ConfirmSessionCommand {
                session_id: "cs_1".to_string(),
                identity: None,
            })
            .await
            .unwrap();

        assert!(!result.is_premium);
        let snapshot = cache.snapshot();
        assert!(!snapshot["app-user-42"].is_premium);
        assert_eq!(
            snapshot["app-user-42"].provider_customer_id.as_deref(),
            Some("cus_1")
        );
    }
}
