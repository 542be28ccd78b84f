//! Canonical premium status translation.
//!
//! One pure function maps every provider status vocabulary to the premium
//! flag. Every event branch and every provider adapter goes through
//! [`translate_status`]; inline copies of this mapping elsewhere are a
//! correctness bug.

use chrono::{DateTime, TimeZone, Utc};

/// Statuses that confer premium access. Closed set: `active`, `trialing`,
/// and `past_due` (bounded by the grace window handled elsewhere).
const PREMIUM_STATUSES: &[&str] = &["active", "trialing", "past_due"];

/// Result of translating a provider status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedStatus {
    pub is_premium: bool,
    pub current_period_end: Option<DateTime<Utc>>,
}

/// Translates a provider subscription status plus its period end (epoch
/// seconds) into canonical premium state.
///
/// Total over arbitrary input: unknown or future vocabulary maps to
/// `is_premium = false`, never an error. The period end is carried through
/// only when the status confers premium; a non-premium status yields no
/// period.
pub fn translate_status(status: &str, period_end_epoch: Option<i64>) -> TranslatedStatus {
    let normalized = status.trim().to_lowercase();
    let is_premium = PREMIUM_STATUSES.contains(&normalized.as_str());

    let current_period_end = if is_premium {
        period_end_epoch.and_then(|secs| Utc.timestamp_opt(secs, 0).single())
    } else {
        None
    };

    TranslatedStatus {
        is_premium,
        current_period_end,
    }
}

/// Normalizes an App Store subscription status code into the shared
/// vocabulary consumed by [`translate_status`].
///
/// Codes per the App Store Server API `status` field:
/// 1 = active, 2 = expired, 3 = billing retry, 4 = billing grace period,
/// 5 = revoked. Billing retry and grace map to `past_due` so the bounded
/// grace semantics match the web path.
pub fn normalize_apple_status(code: i64) -> &'static str {
    match code {
        1 => "active",
        3 | 4 => "past_due",
        2 => "expired",
        5 => "revoked",
        _ => "unknown",
    }
}

/// Translates an App Store status code and expiry (epoch milliseconds).
pub fn translate_apple_status(code: i64, expires_date_ms: Option<i64>) -> TranslatedStatus {
    translate_status(
        normalize_apple_status(code),
        expires_date_ms.map(|ms| ms / 1000),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PERIOD_END: i64 = 1_767_225_600; // 2026-01-01T00:00:00Z

    #[test]
    fn active_is_premium() {
        let translated = translate_status("active", Some(PERIOD_END));
        assert!(translated.is_premium);
        assert_eq!(
            translated.current_period_end.map(|t| t.timestamp()),
            Some(PERIOD_END)
        );
    }

    #[test]
    fn trialing_is_premium() {
        assert!(translate_status("trialing", Some(PERIOD_END)).is_premium);
    }

    #[test]
    fn past_due_is_premium_during_grace() {
        assert!(translate_status("past_due", Some(PERIOD_END)).is_premium);
    }

    #[test]
    fn canceled_is_not_premium() {
        let translated = translate_status("canceled", Some(PERIOD_END));
        assert!(!translated.is_premium);
        assert!(translated.current_period_end.is_none());
    }

    #[test]
    fn incomplete_expired_is_not_premium() {
        assert!(!translate_status("incomplete_expired", Some(PERIOD_END)).is_premium);
    }

    #[test]
    fn unpaid_is_not_premium() {
        assert!(!translate_status("unpaid", Some(PERIOD_END)).is_premium);
    }

    #[test]
    fn status_is_case_and_whitespace_insensitive() {
        assert!(translate_status(" Active ", Some(PERIOD_END)).is_premium);
        assert!(translate_status("TRIALING", None).is_premium);
    }

    #[test]
    fn premium_without_period_end_keeps_none() {
        let translated = translate_status("active", None);
        assert!(translated.is_premium);
        assert!(translated.current_period_end.is_none());
    }

    #[test]
    fn apple_active_is_premium() {
        let translated = translate_apple_status(1, Some(PERIOD_END * 1000));
        assert!(translated.is_premium);
        assert_eq!(
            translated.current_period_end.map(|t| t.timestamp()),
            Some(PERIOD_END)
        );
    }

    #[test]
    fn apple_billing_retry_and_grace_are_premium() {
        assert!(translate_apple_status(3, Some(PERIOD_END * 1000)).is_premium);
        assert!(translate_apple_status(4, Some(PERIOD_END * 1000)).is_premium);
    }

    #[test]
    fn apple_expired_and_revoked_are_not_premium() {
        assert!(!translate_apple_status(2, Some(PERIOD_END * 1000)).is_premium);
        assert!(!translate_apple_status(5, Some(PERIOD_END * 1000)).is_premium);
    }

    #[test]
    fn apple_unknown_code_is_not_premium() {
        assert!(!translate_apple_status(99, None).is_premium);
        assert!(!translate_apple_status(-1, None).is_premium);
    }

    proptest! {
        // Totality: any status string produces a deterministic result and
        // never panics; anything outside the closed premium set is false.
        #[test]
        fn translation_is_total(status in ".{0,64}", period in proptest::option::of(any::<i64>())) {
            let first = translate_status(&status, period);
            let second = translate_status(&status, period);
            prop_assert_eq!(first.clone(), second);

            let normalized = status.trim().to_lowercase();
            if !["active", "trialing", "past_due"].contains(&normalized.as_str()) {
                prop_assert!(!first.is_premium);
                prop_assert!(first.current_period_end.is_none());
            }
        }

        #[test]
        fn apple_normalization_is_total(code in any::<i64>()) {
            let vocab = normalize_apple_status(code);
            prop_assert!(["active", "past_due", "expired", "revoked", "unknown"].contains(&vocab));
        }
    }
}
