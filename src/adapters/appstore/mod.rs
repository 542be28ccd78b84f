//! App Store server notification adapter.
//!
//! Verifies the ES256 signed payloads Apple delivers to the
//! `/webhook-apple` endpoint. The verification key is operator-pinned
//! via `BILLING_SYNC__PAYMENT__APPLE_SIGNING_KEY_PEM`.

mod jws_verifier;

pub use jws_verifier::AppleJwsVerifier;
