//! User record store port.
//!
//! Contract for the authoritative, durable store of billing records.
//! Lookup-then-update is two steps: resolve the identity (directly or via
//! the provider customer id index), then apply a partial patch by
//! identity.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::billing::{RecordPatch, UserBillingRecord, UserIdentity};

/// Outcome of an update against the authoritative store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The record existed and the patch was applied.
    Updated,
    /// No record exists for the identity. For email identities this is a
    /// normal outcome (the record is created by an external signup
    /// process); callers log it and move on.
    NotFound,
}

/// Errors from the authoritative store.
///
/// Store failures never fail a webhook: callers log them and leave the
/// cache write in place.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
}

/// Port for the authoritative user record store.
#[async_trait]
pub trait UserRecordStore: Send + Sync {
    /// Point lookup by identity.
    async fn find_by_identity(
        &self,
        identity: &UserIdentity,
    ) -> Result<Option<UserBillingRecord>, StoreError>;

    /// Reverse lookup through the stored provider customer association.
    async fn find_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<UserBillingRecord>, StoreError>;

    /// Applies a partial patch to the record for `identity`.
    ///
    /// Update-only: a missing row yields [`UpdateOutcome::NotFound`], it
    /// is never created here. Only the fields the patch names change.
    async fn update(
        &self,
        identity: &UserIdentity,
        patch: &RecordPatch,
    ) -> Result<UpdateOutcome, StoreError>;
}
