//! Provider customer provisioning.
//!
//! Guarantees a live provider-side customer for an identity before a
//! checkout or portal session is created. Ordered: verify the remembered
//! customer, clear it when the provider no longer has it, reuse an
//! existing customer found by email, create as a last resort. Each
//! branch that learns a customer id persists it immediately.

use std::sync::Arc;

use crate::domain::billing::{RecordPatch, UserIdentity};
use crate::ports::{CreateCustomerRequest, PaymentProvider, UserRecordStore};

use super::errors::BillingRequestError;
use super::record_writer::RecordWriter;

/// Provisions provider customers for identities.
pub struct CustomerProvisioner {
    provider: Arc<dyn PaymentProvider>,
    store: Arc<dyn UserRecordStore>,
    writer: RecordWriter,
}

impl CustomerProvisioner {
    pub fn new(
        provider: Arc<dyn PaymentProvider>,
        store: Arc<dyn UserRecordStore>,
        writer: RecordWriter,
    ) -> Self {
        Self {
            provider,
            store,
            writer,
        }
    }

    /// Returns the id of a customer the provider currently knows for
    /// `identity`, creating one if necessary.
    pub async fn ensure_customer(
        &self,
        identity: &UserIdentity,
    ) -> Result<String, BillingRequestError> {
        let remembered = self
            .store
            .find_by_identity(identity)
            .await?
            .and_then(|record| record.provider_customer_id);

        if let Some(customer_id) = remembered {
            if self.provider.get_customer(&customer_id).await?.is_some() {
                return Ok(customer_id);
            }

            // The provider no longer has this customer. Forget it so a
            // dead id is never handed to a checkout session
            tracing::warn!(
                identity = %identity,
                customer_id,
                "Remembered customer no longer exists provider-side, clearing"
            );
            let clear = RecordPatch {
                provider_customer_id: Some(None),
                ..Default::default()
            };
            self.writer.apply(identity, &clear).await;
        }

        if let UserIdentity::Email(email) = identity {
            if let Some(customer) = self.provider.search_customer_by_email(email).await? {
                self.remember(identity, &customer.id).await;
                return Ok(customer.id);
            }
        }

        let created = self
            .provider
            .create_customer(CreateCustomerRequest {
                email: match identity {
                    UserIdentity::Email(email) => Some(email.clone()),
                    UserIdentity::ExternalToken(_) => None,
                },
                identity_key: identity.as_str().to_string(),
            })
            .await?;

        tracing::info!(identity = %identity, customer_id = %created.id, "Provider customer created");
        self.remember(identity, &created.id).await;
        Ok(created.id)
    }

    async fn remember(&self, identity: &UserIdentity, customer_id: &str) {
        self.writer
            .apply(identity, &RecordPatch::customer_id(customer_id))
            .await;
    }
}
