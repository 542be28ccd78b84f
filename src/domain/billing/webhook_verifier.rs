//! Authenticity gate for inbound provider webhooks.
//!
//! Every delivery to `/webhook` passes through [`WebhookVerifier`] before
//! the reconciliation engine sees it. The HMAC covers the raw body bytes
//! exactly as received, so verification happens before any JSON decoding,
//! and a bounded timestamp window stops replayed deliveries from patching
//! records long after the fact.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::stripe_event::StripeEvent;
use super::webhook_errors::WebhookError;

/// Oldest delivery the engine will still apply (seconds).
const MAX_EVENT_AGE_SECS: i64 = 300;

/// Tolerated clock skew for timestamps ahead of ours (seconds).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// The signature header, decoded.
///
/// The provider sends `t=<unix_ts>,v1=<hex_hmac>`, possibly with a legacy
/// `v0` entry and other scheme fields appended. Only `t` and `v1` matter
/// here; everything else is skipped so new header fields cannot break
/// intake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Signing time claimed by the sender.
    pub timestamp: i64,
    /// Decoded HMAC-SHA256 digest from the `v1` entry.
    pub v1_signature: Vec<u8>,
}

impl SignatureHeader {
    /// Decodes a `Stripe-Signature` header value.
    ///
    /// Fails with [`WebhookError::ParseError`] when the timestamp or the
    /// `v1` entry is absent or malformed.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| WebhookError::ParseError("invalid header format".to_string()))?;

            match key {
                "t" => {
                    timestamp = Some(value.parse().map_err(|_| {
                        WebhookError::ParseError("invalid timestamp".to_string())
                    })?);
                }
                "v1" => {
                    v1_signature = Some(hex_decode(value).ok_or_else(|| {
                        WebhookError::ParseError("invalid v1 signature hex".to_string())
                    })?);
                }
                // v0 and future scheme fields are skipped
                _ => {}
            }
        }

        let timestamp =
            timestamp.ok_or_else(|| WebhookError::ParseError("missing timestamp".to_string()))?;
        let v1_signature = v1_signature
            .ok_or_else(|| WebhookError::ParseError("missing v1 signature".to_string()))?;

        Ok(SignatureHeader {
            timestamp,
            v1_signature,
        })
    }
}

/// Checks webhook deliveries against the shared signing secret.
pub struct WebhookVerifier {
    secret: String,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Authenticates a delivery and decodes it into a [`StripeEvent`].
    ///
    /// The digest is recomputed over `"{timestamp}.{raw body}"` with the
    /// shared secret and compared in constant time against the header's
    /// `v1` entry; the claimed timestamp must fall inside the replay
    /// window first. Only an authenticated body gets JSON-decoded.
    ///
    /// # Errors
    ///
    /// - [`WebhookError::TimestampOutOfRange`] - delivery too old
    /// - [`WebhookError::InvalidTimestamp`] - timestamp too far ahead
    /// - [`WebhookError::InvalidSignature`] - digest mismatch
    /// - [`WebhookError::ParseError`] - bad header or undecodable body
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<StripeEvent, WebhookError> {
        let header = SignatureHeader::parse(signature_header)?;

        self.check_replay_window(header.timestamp)?;

        let expected = self.compute_signature(header.timestamp, payload);
        if !digests_match(&expected, &header.v1_signature) {
            return Err(WebhookError::InvalidSignature);
        }

        let event: StripeEvent = serde_json::from_slice(payload)
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;

        Ok(event)
    }

    fn check_replay_window(&self, timestamp: i64) -> Result<(), WebhookError> {
        let age = chrono::Utc::now().timestamp() - timestamp;

        if age > MAX_EVENT_AGE_SECS {
            return Err(WebhookError::TimestampOutOfRange);
        }
        if age < -MAX_CLOCK_SKEW_SECS {
            return Err(WebhookError::InvalidTimestamp);
        }

        Ok(())
    }

    fn compute_signature(&self, timestamp: i64, payload: &[u8]) -> Vec<u8> {
        let signed_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));

        let mut mac =
            Hmac::<Sha256>::new_from_slice(self.secret.as_bytes()).expect("HMAC accepts any key");
        mac.update(signed_payload.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

/// Constant-time digest comparison; digest length is fixed by the scheme.
fn digests_match(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Decode a hex string to bytes. Returns None for odd-length or non-hex
/// input.
fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    let hex = hex.trim();
    if hex.len() % 2 != 0 {
        return None;
    }

    let mut bytes = Vec::with_capacity(hex.len() / 2);
    for i in (0..hex.len()).step_by(2) {
        let byte = u8::from_str_radix(&hex[i..i + 2], 16).ok()?;
        bytes.push(byte);
    }
    Some(bytes)
}

/// Computes a hex HMAC-SHA256 signature for use in test fixtures.
#[cfg(test)]
pub fn compute_test_signature(secret: &str, timestamp: i64, payload: &str) -> String {
    let signed_payload = format!("{}.{}", timestamp, payload);
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key");
    mac.update(signed_payload.as_bytes());
    mac.finalize()
        .into_bytes()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
