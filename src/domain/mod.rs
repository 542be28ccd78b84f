//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `billing` - Billing record reconciliation, status translation, and
//!   webhook verification

pub mod billing;
