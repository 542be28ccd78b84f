//! Dual-write path for billing record patches.
//!
//! Every external write goes through here: the local snapshot cache is
//! written first, then the authoritative store. A store failure is
//! logged and does not roll the cache back; the next definitive webhook
//! reconverges both sides.

use std::sync::Arc;

use crate::domain::billing::{RecordPatch, UserBillingRecord, UserIdentity};
use crate::ports::{SnapshotCache, UpdateOutcome, UserRecordStore};

/// Applies record patches to the cache and the authoritative store.
pub struct RecordWriter {
    store: Arc<dyn UserRecordStore>,
    cache: Arc<dyn SnapshotCache>,
}

impl RecordWriter {
    pub fn new(store: Arc<dyn UserRecordStore>, cache: Arc<dyn SnapshotCache>) -> Self {
        Self { store, cache }
    }

    /// Applies `patch` for `identity`, cache first, then store.
    ///
    /// The cache upserts for any identity kind: it is a best-effort
    /// mirror, and token-keyed records come into being here. The
    /// authoritative store stays update-only; a missing row there is a
    /// logged skip (email records are created by the signup process).
    pub async fn apply(&self, identity: &UserIdentity, patch: &RecordPatch) {
        if patch.is_empty() {
            return;
        }

        let mut snapshot = self.cache.read().await;
        let entry = snapshot
            .entry(identity.as_str().to_string())
            .or_insert_with(|| UserBillingRecord::new(identity.clone()));
        patch.apply_to(entry);

        if let Err(e) = self.cache.write(&snapshot).await {
            tracing::warn!(error = %e, identity = %identity, "Snapshot cache write failed");
        }

        match self.store.update(identity, patch).await {
            Ok(UpdateOutcome::Updated) => {}
            Ok(UpdateOutcome::NotFound) => {
                tracing::info!(
                    identity = %identity,
                    "No authoritative record for identity, store update skipped"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, identity = %identity, "Authoritative store write failed");
            }
        }
    }
}
