//! App Store server notification payloads (version 2).
//!
//! Apple delivers a `signedPayload` JWS whose claims in turn carry nested
//! signed transaction and renewal JWS strings. These are the decoded claim
//! shapes; verification of the signatures happens in the App Store
//! adapter before any of these fields are trusted.

use serde::{Deserialize, Serialize};

/// Request body of an App Store server notification.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppleNotificationEnvelope {
    /// JWS (ES256) containing an [`AppleNotificationPayload`].
    pub signed_payload: String,
}

/// Decoded claims of the outer notification JWS.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppleNotificationPayload {
    /// Notification type (e.g., "SUBSCRIBED", "DID_RENEW", "EXPIRED").
    pub notification_type: String,

    /// Optional subtype refining the notification type.
    #[serde(default)]
    pub subtype: Option<String>,

    /// Unique notification identifier, for log correlation.
    #[serde(default, rename = "notificationUUID")]
    pub notification_uuid: Option<String>,

    /// Notification data.
    pub data: AppleNotificationData,
}

/// The `data` object of a notification payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppleNotificationData {
    /// Bundle ID of the app the notification concerns.
    #[serde(default)]
    pub bundle_id: Option<String>,

    /// "Sandbox" or "Production".
    #[serde(default)]
    pub environment: Option<String>,

    /// Subscription status code (1 active, 2 expired, 3 billing retry,
    /// 4 grace period, 5 revoked).
    #[serde(default)]
    pub status: Option<i64>,

    /// Nested JWS carrying an [`AppleTransactionInfo`].
    #[serde(default)]
    pub signed_transaction_info: Option<String>,
}

/// Decoded claims of the nested transaction JWS.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppleTransactionInfo {
    /// Opaque account token the app set at purchase time. This is the
    /// only identity correlation Apple provides.
    #[serde(default)]
    pub app_account_token: Option<String>,

    /// Purchased product identifier.
    #[serde(default)]
    pub product_id: Option<String>,

    /// Original transaction identifier, stable across renewals.
    #[serde(default)]
    pub original_transaction_id: Option<String>,

    /// Subscription expiry in milliseconds since epoch.
    #[serde(default)]
    pub expires_date: Option<i64>,
}
