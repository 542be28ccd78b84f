//! HTTP DTOs (Data Transfer Objects) for billing endpoints.
//!
//! These types define the JSON request/response structure for the billing
//! API. They serve as the boundary between HTTP and the application layer.

use serde::{Deserialize, Serialize};

use crate::domain::billing::{UserBillingRecord, UserIdentity};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to create a hosted checkout session.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionRequest {
    /// Web user email.
    #[serde(default)]
    pub email: Option<String>,
    /// App user token.
    #[serde(default)]
    pub external_token: Option<String>,
}

/// Request to create a billing portal session.
#[derive(Debug, Clone, Deserialize)]
pub struct PortalSessionRequest {
    /// Email of the web user whose portal to open.
    pub email: String,
}

/// Query parameters for the status endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusParams {
    /// Raw identity string (email or external token).
    pub identity: String,
}

/// Request to confirm a checkout session after the success redirect.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmSessionRequest {
    /// Session id substituted into the success URL by the provider.
    pub session_id: String,
    /// Optional identity override.
    #[serde(default)]
    pub identity: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Response carrying a hosted session redirect URL.
#[derive(Debug, Clone, Serialize)]
pub struct SessionUrlResponse {
    pub url: String,
}

/// Acknowledgement body for webhook deliveries.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAckResponse {
    pub received: bool,
}

/// Response for the status endpoint. `user` is null for unknown
/// identities.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub user: Option<BillingRecordResponse>,
}

/// Billing record as exposed over the API.
#[derive(Debug, Clone, Serialize)]
pub struct BillingRecordResponse {
    /// Raw identity key.
    pub identity: String,
    /// "email" or "external_token".
    pub identity_kind: String,
    pub is_premium: bool,
    /// ISO 8601, when a paid period is known.
    pub current_period_end: Option<String>,
    pub provider_customer_id: Option<String>,
    pub provider_subscription_id: Option<String>,
    /// ISO 8601 grace deadline, when a payment failure is pending.
    pub grace_until: Option<String>,
    pub platform: String,
}

impl From<UserBillingRecord> for BillingRecordResponse {
    fn from(record: UserBillingRecord) -> Self {
        let identity_kind = match &record.identity {
            UserIdentity::Email(_) => "email",
            UserIdentity::ExternalToken(_) => "external_token",
        };
        Self {
            identity: record.identity.as_str().to_string(),
            identity_kind: identity_kind.to_string(),
            is_premium: record.is_premium,
            current_period_end: record.current_period_end.map(|t| t.to_rfc3339()),
            provider_customer_id: record.provider_customer_id,
            provider_subscription_id: record.provider_subscription_id,
            grace_until: record.grace_until.map(|t| t.to_rfc3339()),
            platform: record.platform.as_str().to_string(),
        }
    }
}

/// Response for session confirmation.
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmSessionResponse {
    pub identity: String,
    pub is_premium: bool,
}

/// Standard error response body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn record_response_from_record() {
        let mut record =
            UserBillingRecord::new(UserIdentity::email("user@example.com"));
        record.is_premium = true;
        record.current_period_end = Some(Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap());
        record.provider_customer_id = Some("cus_1".to_string());

        let response = BillingRecordResponse::from(record);

        assert_eq!(response.identity, "user@example.com");
        assert_eq!(response.identity_kind, "email");
        assert!(response.is_premium);
        assert!(response
            .current_period_end
            .as_deref()
            .unwrap()
            .starts_with("2026-03-01"));
        assert_eq!(response.platform, "web");
    }

    #[test]
    fn token_record_reports_kind() {
        let record = UserBillingRecord::new(UserIdentity::external_token("app-user-42"));
        let response = BillingRecordResponse::from(record);
        assert_eq!(response.identity_kind, "external_token");
        assert!(response.current_period_end.is_none());
    }

    #[test]
    fn checkout_request_fields_are_optional() {
        let request: CheckoutSessionRequest = serde_json::from_str("{}").unwrap();
        assert!(request.email.is_none());
        assert!(request.external_token.is_none());
    }

    #[test]
    fn status_response_serializes_null_user() {
        let json = serde_json::to_string(&StatusResponse { user: None }).unwrap();
        assert_eq!(json, r#"{"user":null}"#);
    }
}
