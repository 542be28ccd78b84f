//! Stripe REST API response types.
//!
//! Only the fields this service reads are captured; everything else in
//! Stripe's schemas is ignored.

use serde::Deserialize;

/// Customer object returned by `/v1/customers`.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeCustomer {
    /// Customer identifier (cus_...).
    pub id: String,

    /// Customer email address.
    #[serde(default)]
    pub email: Option<String>,

    /// True when the customer has been deleted.
    #[serde(default)]
    pub deleted: bool,
}

/// List envelope for customer queries.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeCustomerList {
    #[serde(default)]
    pub data: Vec<StripeCustomer>,
}

/// Subscription object returned by `/v1/subscriptions`.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscriptionObject {
    /// Subscription identifier (sub_...).
    pub id: String,

    /// Owning customer identifier.
    pub customer: String,

    /// Subscription status string.
    pub status: String,

    /// Current billing period end (Unix timestamp).
    #[serde(default)]
    pub current_period_end: Option<i64>,

    /// Whether the subscription cancels at period end.
    #[serde(default)]
    pub cancel_at_period_end: bool,
}

/// Checkout session object returned by `/v1/checkout/sessions`.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeCheckoutSessionObject {
    /// Session identifier (cs_...).
    pub id: String,

    /// Hosted checkout URL (present on freshly created sessions).
    #[serde(default)]
    pub url: Option<String>,

    /// Associated customer.
    #[serde(default)]
    pub customer: Option<String>,

    /// Subscription created by the session.
    #[serde(default)]
    pub subscription: Option<String>,

    /// Correlation token echoed back unchanged.
    #[serde(default)]
    pub client_reference_id: Option<String>,

    /// Email collected at checkout.
    #[serde(default)]
    pub customer_email: Option<String>,

    /// Payment status ("paid", "unpaid", "no_payment_required").
    #[serde(default)]
    pub payment_status: Option<String>,
}

/// Billing portal session returned by `/v1/billing_portal/sessions`.
#[derive(Debug, Clone, Deserialize)]
pub struct StripePortalSessionObject {
    pub id: String,
    pub url: String,
}
