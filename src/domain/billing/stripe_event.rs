//! Stripe webhook event envelope and typed payloads.
//!
//! The envelope keeps `data.object` as raw JSON until the event type is
//! known, then [`StripeEvent::payload`] produces a tagged, strongly typed
//! payload variant. Handlers match on the variant instead of probing an
//! untyped object.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::webhook_errors::WebhookError;

/// Stripe webhook event envelope (simplified).
///
/// Only fields relevant to reconciliation are captured; the rest of
/// Stripe's event schema is ignored.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEvent {
    /// Unique identifier for the event (evt_xxx format).
    pub id: String,

    /// Type of event (e.g., "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time at which the event was created (Unix timestamp).
    pub created: i64,

    /// Object containing event-specific data.
    pub data: StripeEventData,

    /// Whether this is a live mode event (vs test mode).
    pub livemode: bool,

    /// API version used to render this event.
    #[serde(default)]
    pub api_version: Option<String>,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    /// The object that triggered the event (typed by event type).
    pub object: serde_json::Value,
}

impl StripeEvent {
    /// Returns true if this is a live mode event.
    pub fn is_live(&self) -> bool {
        self.livemode
    }

    /// Resolves the envelope into a typed payload keyed by event type.
    ///
    /// Unhandled event types come back as [`EventPayload::Other`] so the
    /// dispatcher can acknowledge them without processing.
    pub fn payload(&self) -> Result<EventPayload, WebhookError> {
        let object = self.data.object.clone();
        let parse_err = |e: serde_json::Error| WebhookError::ParseError(e.to_string());

        let payload = match self.event_type.as_str() {
            "checkout.session.completed" => {
                EventPayload::CheckoutCompleted(serde_json::from_value(object).map_err(parse_err)?)
            }
            "customer.subscription.created" => {
                EventPayload::SubscriptionCreated(serde_json::from_value(object).map_err(parse_err)?)
            }
            "customer.subscription.updated" => {
                EventPayload::SubscriptionUpdated(serde_json::from_value(object).map_err(parse_err)?)
            }
            "customer.subscription.deleted" => {
                EventPayload::SubscriptionDeleted(serde_json::from_value(object).map_err(parse_err)?)
            }
            "invoice.payment_failed" => {
                EventPayload::InvoicePaymentFailed(serde_json::from_value(object).map_err(parse_err)?)
            }
            other => EventPayload::Other {
                event_type: other.to_string(),
            },
        };

        Ok(payload)
    }
}

/// Typed event payload, tagged by event type.
#[derive(Debug, Clone)]
pub enum EventPayload {
    CheckoutCompleted(CheckoutSessionPayload),
    SubscriptionCreated(SubscriptionPayload),
    SubscriptionUpdated(SubscriptionPayload),
    SubscriptionDeleted(SubscriptionPayload),
    InvoicePaymentFailed(InvoicePayload),
    /// Event type this engine does not reconcile; acknowledged and logged.
    Other { event_type: String },
}

/// Checkout session object from `checkout.session.completed`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckoutSessionPayload {
    /// Session identifier (cs_...).
    pub id: String,

    /// Associated customer (cus_...), if the session created one.
    #[serde(default)]
    pub customer: Option<String>,

    /// Email provided at checkout.
    #[serde(default)]
    pub customer_email: Option<String>,

    /// Customer details collected by the session.
    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,

    /// Correlation token attached at session creation and echoed back
    /// unchanged by the provider.
    #[serde(default)]
    pub client_reference_id: Option<String>,

    /// Subscription created by the session (sub_...), if any.
    #[serde(default)]
    pub subscription: Option<String>,

    /// Metadata attached at session creation.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Nested customer details on a checkout session.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CustomerDetails {
    #[serde(default)]
    pub email: Option<String>,
}

impl CheckoutSessionPayload {
    /// The correlation token, from the client reference or metadata.
    pub fn correlation_token(&self) -> Option<&str> {
        self.client_reference_id
            .as_deref()
            .or_else(|| self.metadata.get("user_token").map(String::as_str))
    }

    /// The best available email for this session.
    pub fn email(&self) -> Option<&str> {
        self.customer_details
            .as_ref()
            .and_then(|d| d.email.as_deref())
            .or(self.customer_email.as_deref())
            .or_else(|| self.metadata.get("email").map(String::as_str))
    }
}

/// Subscription object from `customer.subscription.*` events.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubscriptionPayload {
    /// Subscription identifier (sub_...).
    pub id: String,

    /// Owning customer (cus_...).
    pub customer: String,

    /// Provider status string (active, trialing, past_due, canceled, ...).
    pub status: String,

    /// End of the current billing period (Unix timestamp).
    #[serde(default)]
    pub current_period_end: Option<i64>,

    /// Whether the subscription is set to cancel at period end.
    #[serde(default)]
    pub cancel_at_period_end: bool,

    /// Metadata attached when the subscription was created.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl SubscriptionPayload {
    /// Correlation token propagated into subscription metadata at checkout.
    pub fn correlation_token(&self) -> Option<&str> {
        self.metadata.get("user_token").map(String::as_str)
    }
}

/// Invoice object from `invoice.payment_failed`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InvoicePayload {
    /// Owning customer (cus_...).
    #[serde(default)]
    pub customer: Option<String>,

    /// Subscription the invoice bills, if any.
    #[serde(default)]
    pub subscription: Option<String>,

    /// Email on the invoice.
    #[serde(default)]
    pub customer_email: Option<String>,

    /// Number of payment attempts made so far.
    #[serde(default)]
    pub attempt_count: u32,

    /// Scheduled next attempt (Unix timestamp), if the provider retries.
    #[serde(default)]
    pub next_payment_attempt: Option<i64>,
}

/// Builder for creating test StripeEvent instances.
#[cfg(test)]
pub struct StripeEventBuilder {
    id: String,
    event_type: String,
    created: i64,
    object: serde_json::Value,
    livemode: bool,
}

#[cfg(test)]
impl Default for StripeEventBuilder {
    fn default() -> Self {
        Self {
            id: "evt_test_123".to_string(),
            event_type: "checkout.session.completed".to_string(),
            created: chrono::Utc::now().timestamp(),
            object: serde_json::json!({}),
            livemode: false,
        }
    }
}

#[cfg(test)]
impl StripeEventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    pub fn object(mut self, object: serde_json::Value) -> Self {
        self.object = object;
        self
    }

    pub fn livemode(mut self, livemode: bool) -> Self {
        self.livemode = livemode;
        self
    }

    pub fn build(self) -> StripeEvent {
        StripeEvent {
            id: self.id,
            event_type: self.event_type,
            created: self.created,
            data: StripeEventData {
                object: self.object,
            },
            livemode: self.livemode,
            api_version: Some("2023-10-16".to_string()),
        }
    }
}
