//! Billing Sync - Webhook-driven billing status synchronization.
//!
//! Keeps a canonical per-user premium status in sync with the payment
//! provider by consuming webhook events, with a PostgreSQL store as the
//! source of truth and a local snapshot file as a fast mirror.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
