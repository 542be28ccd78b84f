//! Billing domain module.
//!
//! The reconciliation core: identity, the billing record and its patch
//! semantics, canonical status translation, webhook event types and
//! verification.
//!
//! # Module Structure
//!
//! - `identity` - Polymorphic user identity (email / external token)
//! - `record` - UserBillingRecord aggregate and RecordPatch merge
//! - `status` - Canonical premium status translation
//! - `stripe_event` - Webhook event envelope and typed payloads
//! - `webhook_verifier` - HMAC signature verification over raw bytes
//! - `webhook_errors` - Error taxonomy with HTTP mapping
//! - `apple_notification` - App Store server notification payloads

mod apple_notification;
mod identity;
mod record;
mod status;
mod stripe_event;
mod webhook_errors;
mod webhook_verifier;

pub use apple_notification::{
    AppleNotificationData, AppleNotificationEnvelope, AppleNotificationPayload,
    AppleTransactionInfo,
};
pub use identity::{ResolvedIdentity, UserIdentity};
pub use record::{Platform, RecordPatch, UserBillingRecord};
pub use status::{normalize_apple_status, translate_apple_status, translate_status, TranslatedStatus};
pub use stripe_event::{
    CheckoutSessionPayload, CustomerDetails, EventPayload, InvoicePayload, StripeEvent,
    StripeEventData, SubscriptionPayload,
};
pub use webhook_errors::WebhookError;
pub use webhook_verifier::{SignatureHeader, WebhookVerifier};

#[cfg(test)]
pub use stripe_event::StripeEventBuilder;
#[cfg(test)]
pub use webhook_verifier::compute_test_signature;
