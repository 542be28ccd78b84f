//! CreatePortalSessionHandler - Command handler for opening the billing portal.

use std::sync::Arc;

use crate::domain::billing::UserIdentity;
use crate::ports::{HostedSession, PaymentProvider, UserRecordStore};

use super::errors::BillingRequestError;

/// Command to create a billing portal session.
#[derive(Debug, Clone)]
pub struct CreatePortalSessionCommand {
    pub email: String,
}

/// Handler for creating billing portal sessions.
///
/// Portal access requires an existing customer association; unlike
/// checkout, nothing is provisioned here.
pub struct CreatePortalSessionHandler {
    provider: Arc<dyn PaymentProvider>,
    store: Arc<dyn UserRecordStore>,
    public_base_url: String,
}

impl CreatePortalSessionHandler {
    pub fn new(
        provider: Arc<dyn PaymentProvider>,
        store: Arc<dyn UserRecordStore>,
        public_base_url: String,
    ) -> Self {
        Self {
            provider,
            store,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn handle(
        &self,
        cmd: CreatePortalSessionCommand,
    ) -> Result<HostedSession, BillingRequestError> {
        if !cmd.email.contains('@') {
            return Err(BillingRequestError::InvalidRequest(
                "A valid email is required".to_string(),
            ));
        }
        let identity = UserIdentity::email(&cmd.email);

        let record = self
            .store
            .find_by_identity(&identity)
            .await?
            .ok_or(BillingRequestError::NotFound("billing record"))?;

        let customer_id = record
            .provider_customer_id
            .ok_or(BillingRequestError::NotFound("customer"))?;

        let return_url = format!("{}/account", self.public_base_url);
        let session = self
            .provider
            .create_portal_session(&customer_id, &return_url)
            .await?;

        tracing::info!(identity = %identity, session_id = %session.id, "Portal session created");
        Ok(session)
    }
}
