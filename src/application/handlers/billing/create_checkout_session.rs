//! CreateCheckoutSessionHandler - Command handler for starting a hosted checkout.

use std::sync::Arc;

use crate::domain::billing::UserIdentity;
use crate::ports::{CreateCheckoutRequest, HostedSession, PaymentProvider};

use super::ensure_customer::CustomerProvisioner;
use super::errors::BillingRequestError;

/// Command to create a hosted checkout session.
#[derive(Debug, Clone)]
pub struct CreateCheckoutSessionCommand {
    /// Web user email, when known.
    pub email: Option<String>,
    /// App user token, when the request comes from the app.
    pub external_token: Option<String>,
}

/// Handler for creating hosted checkout sessions.
///
/// Provisions a provider customer for the identity first, so the webhook
/// events produced by the resulting session always carry a customer id
/// the store can correlate.
pub struct CreateCheckoutSessionHandler {
    provider: Arc<dyn PaymentProvider>,
    provisioner: CustomerProvisioner,
    price_id: Option<String>,
    public_base_url: String,
}

impl CreateCheckoutSessionHandler {
    pub fn new(
        provider: Arc<dyn PaymentProvider>,
        provisioner: CustomerProvisioner,
        price_id: Option<String>,
        public_base_url: String,
    ) -> Self {
        Self {
            provider,
            provisioner,
            price_id,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateCheckoutSessionCommand,
    ) -> Result<HostedSession, BillingRequestError> {
        let identity = Self::identity_from(&cmd)?;

        let price_id = self
            .price_id
            .clone()
            .ok_or_else(|| BillingRequestError::InvalidRequest("No price configured".to_string()))?;

        let customer_id = self.provisioner.ensure_customer(&identity).await?;

        // {CHECKOUT_SESSION_ID} is substituted by the provider at redirect
        // time, it is not a format placeholder here
        let success_url = format!(
            "{}/success?session_id={{CHECKOUT_SESSION_ID}}",
            self.public_base_url
        );
        let cancel_url = format!("{}/cancel", self.public_base_url);

        let correlation_token = match &identity {
            UserIdentity::ExternalToken(token) => Some(token.clone()),
            UserIdentity::Email(_) => None,
        };

        let session = self
            .provider
            .create_checkout_session(CreateCheckoutRequest {
                customer_id: Some(customer_id),
                email: cmd.email,
                correlation_token,
                price_id,
                success_url,
                cancel_url,
            })
            .await?;

        tracing::info!(identity = %identity, session_id = %session.id, "Checkout session created");
        Ok(session)
    }

    fn identity_from(cmd: &CreateCheckoutSessionCommand) -> Result<UserIdentity, BillingRequestError> {
        if let Some(token) = cmd.external_token.as_deref().filter(|t| !t.trim().is_empty()) {
            return Ok(UserIdentity::external_token(token));
        }
        if let Some(email) = cmd.email.as_deref().filter(|e| e.contains('@')) {
            return Ok(UserIdentity::email(email));
        }
        Err(BillingRequestError::InvalidRequest(
            "Either external_token or email is required".to_string(),
        ))
    }
}
