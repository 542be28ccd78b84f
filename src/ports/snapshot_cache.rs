//! Local snapshot cache port.
//!
//! Best-effort, file-backed mirror of the user record set. Never the
//! source of truth: it exists as an operational fallback and debugging
//! aid, and its failures are logged rather than propagated.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

use crate::domain::billing::UserBillingRecord;

/// Full cache contents: a map from identity key string to record.
pub type Snapshot = HashMap<String, UserBillingRecord>;

/// Errors from the snapshot cache backend.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(String),

    #[error("Cache serialization error: {0}")]
    Serialize(String),
}

/// Port for the local snapshot cache.
#[async_trait]
pub trait SnapshotCache: Send + Sync {
    /// Reads the full snapshot.
    ///
    /// Infallible by contract: a missing, empty, or malformed backing
    /// file is an empty snapshot plus a logged warning, never an error.
    async fn read(&self) -> Snapshot;

    /// Replaces the full snapshot.
    ///
    /// Failures are returned for logging but must not abort the caller's
    /// authoritative-store write.
    async fn write(&self, snapshot: &Snapshot) -> Result<(), CacheError>;
}
