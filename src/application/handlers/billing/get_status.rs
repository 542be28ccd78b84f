//! GetStatusHandler - Query handler for reading a billing record.

use std::sync::Arc;

use crate::domain::billing::{UserBillingRecord, UserIdentity};
use crate::ports::UserRecordStore;

use super::errors::BillingRequestError;

/// Query for the billing record of one identity.
#[derive(Debug, Clone)]
pub struct GetStatusQuery {
    /// Raw identity string; anything with `@` is an email, the rest are
    /// external tokens.
    pub identity: String,
}

/// Result of a status query. `record` is None for unknown identities,
/// which is an answer rather than an error.
#[derive(Debug, Clone)]
pub struct GetStatusResult {
    pub record: Option<UserBillingRecord>,
}

/// Handler for billing status queries.
pub struct GetStatusHandler {
    store: Arc<dyn UserRecordStore>,
}

impl GetStatusHandler {
    pub fn new(store: Arc<dyn UserRecordStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, query: GetStatusQuery) -> Result<GetStatusResult, BillingRequestError> {
        let raw = query.identity.trim();
        if raw.is_empty() {
            return Err(BillingRequestError::InvalidRequest(
                "identity must not be empty".to_string(),
            ));
        }

        let identity = UserIdentity::parse(raw);
        let record = self.store.find_by_identity(&identity).await?;
        Ok(GetStatusResult { record })
    }
}
