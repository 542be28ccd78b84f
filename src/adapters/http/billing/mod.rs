//! HTTP adapter for billing endpoints.
//!
//! Exposes the billing sync service via REST API:
//! - `POST /webhook` - Provider webhook events (signature verified)
//! - `POST /webhook-apple` - App Store server notifications (JWS verified)
//! - `POST /create-checkout-session` - Start the hosted checkout flow
//! - `POST /create-portal-session` - Open the billing portal
//! - `GET /status` - Read the billing record for an identity
//! - `POST /confirm-session` - Confirm checkout after the success redirect

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::BillingAppState;
pub use routes::billing_router;
