//! User billing record aggregate and partial patches.
//!
//! A record is the canonical billing state for one identity. All writes go
//! through [`RecordPatch::apply_to`], a last-write-wins partial merge: a
//! patch only overwrites the fields it names, so replaying the same patch
//! converges to the same state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::UserIdentity;

/// Provider surface that last updated a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Web checkout subscription (Stripe).
    #[default]
    Web,
    /// Mobile in-app purchase (App Store).
    AppleIap,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::AppleIap => "apple_iap",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "web" => Some(Self::Web),
            "apple_iap" => Some(Self::AppleIap),
            _ => None,
        }
    }
}

/// Canonical billing state for one user identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserBillingRecord {
    /// Stable primary key, immutable once assigned.
    pub identity: UserIdentity,

    /// Derived premium flag. Only the status translator sets this.
    pub is_premium: bool,

    /// End of the current paid period; None when no active period known.
    pub current_period_end: Option<DateTime<Utc>>,

    /// Billing-provider-side customer identifier. Cleared and
    /// re-provisioned when a liveness check against the provider fails.
    pub provider_customer_id: Option<String>,

    /// Active subscription identifier; None when none exists.
    pub provider_subscription_id: Option<String>,

    /// Grace window deadline set on payment failure; premium is not
    /// revoked until a definitive later event.
    pub grace_until: Option<DateTime<Utc>>,

    /// Provider surface that last updated this record.
    #[serde(default)]
    pub platform: Platform,
}

impl UserBillingRecord {
    /// A fresh record with defaults for a previously unknown identity.
    pub fn new(identity: UserIdentity) -> Self {
        Self {
            identity,
            is_premium: false,
            current_period_end: None,
            provider_customer_id: None,
            provider_subscription_id: None,
            grace_until: None,
            platform: Platform::default(),
        }
    }
}

/// Partial update over a [`UserBillingRecord`].
///
/// The double `Option` on nullable fields distinguishes "leave alone"
/// (outer None) from "set to null" (inner None).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPatch {
    pub is_premium: Option<bool>,
    pub current_period_end: Option<Option<DateTime<Utc>>>,
    pub provider_customer_id: Option<Option<String>>,
    pub provider_subscription_id: Option<Option<String>>,
    pub grace_until: Option<Option<DateTime<Utc>>>,
    pub platform: Option<Platform>,
}

impl RecordPatch {
    /// Patch carrying only a customer id.
    pub fn customer_id(id: impl Into<String>) -> Self {
        Self {
            provider_customer_id: Some(Some(id.into())),
            ..Default::default()
        }
    }

    /// Patch produced when a subscription is deleted: premium revoked,
    /// subscription and period cleared.
    pub fn subscription_cleared() -> Self {
        Self {
            is_premium: Some(false),
            current_period_end: Some(None),
            provider_subscription_id: Some(None),
            ..Default::default()
        }
    }

    /// Patch setting only the grace deadline.
    pub fn grace(until: DateTime<Utc>) -> Self {
        Self {
            grace_until: Some(Some(until)),
            ..Default::default()
        }
    }

    /// True when the patch names no fields at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies the patch to a record, overwriting only the named fields.
    pub fn apply_to(&self, record: &mut UserBillingRecord) {
        if let Some(is_premium) = self.is_premium {
            record.is_premium = is_premium;
        }
        if let Some(period_end) = self.current_period_end {
            record.current_period_end = period_end;
        }
        if let Some(customer_id) = &self.provider_customer_id {
            record.provider_customer_id = customer_id.clone();
        }
        if let Some(subscription_id) = &self.provider_subscription_id {
            record.provider_subscription_id = subscription_id.clone();
        }
        if let Some(grace_until) = self.grace_until {
            record.grace_until = grace_until;
        }
        if let Some(platform) = self.platform {
            record.platform = platform;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_record() -> UserBillingRecord {
        let mut record = UserBillingRecord::new(UserIdentity::email("user@example.com"));
        record.is_premium = true;
        record.current_period_end = Some(Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap());
        record.provider_customer_id = Some("cus_123".to_string());
        record.provider_subscription_id = Some("sub_456".to_string());
        record
    }

    #[test]
    fn new_record_has_defaults() {
        let record = UserBillingRecord::new(UserIdentity::external_token("tok"));
        assert!(!record.is_premium);
        assert!(record.current_period_end.is_none());
        assert!(record.provider_customer_id.is_none());
        assert!(record.provider_subscription_id.is_none());
        assert!(record.grace_until.is_none());
        assert_eq!(record.platform, Platform::Web);
    }

    #[test]
    fn patch_overwrites_only_named_fields() {
        let mut record = sample_record();
        let patch = RecordPatch {
            is_premium: Some(false),
            ..Default::default()
        };

        patch.apply_to(&mut record);

        assert!(!record.is_premium);
        assert_eq!(record.provider_customer_id.as_deref(), Some("cus_123"));
        assert_eq!(record.provider_subscription_id.as_deref(), Some("sub_456"));
        assert!(record.current_period_end.is_some());
    }

    #[test]
    fn patch_can_set_field_to_null() {
        let mut record = sample_record();
        let patch = RecordPatch {
            provider_subscription_id: Some(None),
            ..Default::default()
        };

        patch.apply_to(&mut record);

        assert!(record.provider_subscription_id.is_none());
        assert_eq!(record.provider_customer_id.as_deref(), Some("cus_123"));
    }

    #[test]
    fn applying_same_patch_twice_is_idempotent() {
        let patch = RecordPatch {
            is_premium: Some(true),
            current_period_end: Some(Some(
                Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap(),
            )),
            provider_subscription_id: Some(Some("sub_new".to_string())),
            platform: Some(Platform::Web),
            ..Default::default()
        };

        let mut once = sample_record();
        patch.apply_to(&mut once);

        let mut twice = sample_record();
        patch.apply_to(&mut twice);
        patch.apply_to(&mut twice);

        assert_eq!(once, twice);
    }

    #[test]
    fn subscription_cleared_patch() {
        let mut record = sample_record();
        RecordPatch::subscription_cleared().apply_to(&mut record);

        assert!(!record.is_premium);
        assert!(record.provider_subscription_id.is_none());
        assert!(record.current_period_end.is_none());
        // Customer association survives a subscription deletion
        assert_eq!(record.provider_customer_id.as_deref(), Some("cus_123"));
    }

    #[test]
    fn grace_patch_leaves_premium_untouched() {
        let mut record = sample_record();
        let deadline = Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap();

        RecordPatch::grace(deadline).apply_to(&mut record);

        assert!(record.is_premium);
        assert_eq!(record.grace_until, Some(deadline));
    }

    #[test]
    fn empty_patch_changes_nothing() {
        let mut record = sample_record();
        let before = record.clone();
        let patch = RecordPatch::default();
        assert!(patch.is_empty());

        patch.apply_to(&mut record);

        assert_eq!(record, before);
    }

    #[test]
    fn platform_roundtrip() {
        for platform in [Platform::Web, Platform::AppleIap] {
            assert_eq!(Platform::parse(platform.as_str()), Some(platform));
        }
        assert_eq!(Platform::parse("android"), None);
    }
}
