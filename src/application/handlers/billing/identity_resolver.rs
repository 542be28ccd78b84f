//! Identity resolution over verified event payloads.
//!
//! Ordered cascade: explicit correlation token, then email, then reverse
//! lookup of the event's customer id through the authoritative store.
//! When every source fails the event is dropped, not errored.

use std::sync::Arc;

use crate::domain::billing::{ResolvedIdentity, UserIdentity};
use crate::ports::UserRecordStore;

/// Resolves the identity an event should be applied to.
pub struct IdentityResolver {
    store: Arc<dyn UserRecordStore>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn UserRecordStore>) -> Self {
        Self { store }
    }

    /// Runs the resolution cascade. First match wins:
    /// 1. `token` - an explicit correlation token (external token identity)
    /// 2. `email` - an email address carried by the payload
    /// 3. `customer_id` - reverse lookup through the stored association
    pub async fn resolve(
        &self,
        token: Option<&str>,
        email: Option<&str>,
        customer_id: Option<&str>,
    ) -> ResolvedIdentity {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            return ResolvedIdentity::Known(UserIdentity::external_token(token));
        }

        if let Some(email) = email.filter(|e| e.contains('@')) {
            return ResolvedIdentity::Known(UserIdentity::email(email));
        }

        if let Some(customer_id) = customer_id {
            match self.store.find_by_customer_id(customer_id).await {
                Ok(Some(record)) => return ResolvedIdentity::Known(record.identity),
                Ok(None) => {}
                Err(e) => {
                    // A store failure during lookup degrades to a drop;
                    // the provider will redeliver definitive events later
                    tracing::error!(error = %e, customer_id, "Reverse identity lookup failed");
                }
            }
        }

        ResolvedIdentity::Unresolved
    }
}
