//! HTTP adapters - REST API implementations.
//!
//! The billing module owns the whole HTTP surface: webhook intake,
//! session creation, and status reads.

pub mod billing;

// Re-export key types for convenience
pub use billing::billing_router;
pub use billing::BillingAppState;
