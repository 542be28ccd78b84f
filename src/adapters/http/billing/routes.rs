//! Axum router configuration for billing endpoints.
//!
//! This module defines the route structure for the billing API and wires
//! the routes to their corresponding handlers.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    confirm_session, create_checkout_session, create_portal_session, get_status,
    handle_apple_webhook, handle_stripe_webhook, BillingAppState,
};

/// Create the webhook router.
///
/// Webhooks carry no user authentication; the Stripe endpoint is
/// verified by signature over the raw body and the Apple endpoint by the
/// JWS signature inside the payload.
///
/// # Routes
/// - `POST /webhook` - Provider webhook events
/// - `POST /webhook-apple` - App Store server notifications
pub fn webhook_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/webhook", post(handle_stripe_webhook))
        .route("/webhook-apple", post(handle_apple_webhook))
}

/// Create the client-facing session and status router.
///
/// # Routes
/// - `POST /create-checkout-session` - Start the hosted checkout flow
/// - `POST /create-portal-session` - Open the billing portal
/// - `GET /status` - Read the billing record for an identity
/// - `POST /confirm-session` - Confirm checkout after the success redirect
pub fn session_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/create-checkout-session", post(create_checkout_session))
        .route("/create-portal-session", post(create_portal_session))
        .route("/status", get(get_status))
        .route("/confirm-session", post(confirm_session))
}

/// Create the complete billing router, suitable for mounting at the
/// application root.
pub fn billing_router() -> Router<BillingAppState> {
    Router::new().merge(webhook_routes()).merge(session_routes())
}
