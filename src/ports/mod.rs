//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `UserRecordStore` - Authoritative billing record store (PostgreSQL)
//! - `SnapshotCache` - Best-effort local file mirror of the record set
//! - `PaymentProvider` - Billing provider API (Stripe)

mod apple_verifier;
mod payment_provider;
mod snapshot_cache;
mod user_record_store;

pub use apple_verifier::AppleNotificationVerifier;
pub use payment_provider::{
    CreateCheckoutRequest, CreateCustomerRequest, HostedSession, PaymentError, PaymentErrorCode,
    PaymentProvider, ProviderCheckoutSession, ProviderCustomer, ProviderSubscription,
};
pub use snapshot_cache::{CacheError, Snapshot, SnapshotCache};
pub use user_record_store::{StoreError, UpdateOutcome, UserRecordStore};
