//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` port for Stripe, covering customer
//! management, subscription lookup, and hosted checkout/portal sessions.
//! Webhook signature verification lives in the domain layer
//! (`domain::billing::WebhookVerifier`) because it is pure computation.
//!
//! # Configuration
//!
//! Required environment variables:
//! - `BILLING_SYNC__PAYMENT__STRIPE_API_KEY`: Stripe secret API key
//! - `BILLING_SYNC__PAYMENT__STRIPE_WEBHOOK_SECRET`: Webhook signing secret (whsec_...)

mod api_types;
mod stripe_adapter;

pub use stripe_adapter::{StripeConfig, StripePaymentAdapter};
