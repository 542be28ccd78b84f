//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `appstore` - App Store signed payload verification
//! - `http` - REST API surface
//! - `postgres` - Authoritative billing record store
//! - `storage` - File-backed snapshot cache
//! - `stripe` - Payment provider API client

pub mod appstore;
pub mod http;
pub mod postgres;
pub mod storage;
pub mod stripe;
