//! Billing handlers.
//!
//! Command and query handlers for billing state synchronization:
//!
//! ## Commands
//! - Processing provider webhook events
//! - Processing App Store server notifications
//! - Creating hosted checkout and billing portal sessions
//! - Confirming a checkout session from the success redirect
//!
//! ## Queries
//! - Get the billing record for an identity

mod confirm_session;
mod create_checkout_session;
mod create_portal_session;
mod ensure_customer;
mod errors;
mod get_status;
mod identity_resolver;
mod process_apple_webhook;
mod process_webhook;
mod record_writer;

// Commands
pub use confirm_session::{ConfirmSessionCommand, ConfirmSessionHandler, ConfirmSessionResult};
pub use create_checkout_session::{CreateCheckoutSessionCommand, CreateCheckoutSessionHandler};
pub use create_portal_session::{CreatePortalSessionCommand, CreatePortalSessionHandler};
pub use process_apple_webhook::{ProcessAppleWebhookCommand, ProcessAppleWebhookHandler};
pub use process_webhook::{ProcessWebhookCommand, ProcessWebhookHandler, ProcessWebhookResult};

// Queries
pub use get_status::{GetStatusHandler, GetStatusQuery, GetStatusResult};

// Shared building blocks
pub use ensure_customer::CustomerProvisioner;
pub use errors::BillingRequestError;
pub use identity_resolver::IdentityResolver;
pub use record_writer::RecordWriter;

/// Mock port implementations shared by the handler tests in this module.
#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::domain::billing::{RecordPatch, UserBillingRecord, UserIdentity};
    use crate::ports::{
        CacheError, CreateCheckoutRequest, CreateCustomerRequest, HostedSession, PaymentError,
        PaymentProvider, ProviderCheckoutSession, ProviderCustomer, ProviderSubscription,
        Snapshot, SnapshotCache, StoreError, UpdateOutcome, UserRecordStore,
    };

    // ════════════════════════════════════════════════════════════════════════════
    // MockRecordStore
    // ════════════════════════════════════════════════════════════════════════════

    /// In-memory record store. Update-only, like the real one: patches
    /// apply to pre-seeded records and never create rows.
    pub struct MockRecordStore {
        records: Mutex<Vec<UserBillingRecord>>,
        update_calls: Mutex<Vec<(UserIdentity, RecordPatch)>>,
        fail: bool,
    }

    impl MockRecordStore {
        pub fn new() -> Self {
            Self {
                records: Mutex::new(Vec::new()),
                update_calls: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        pub fn with_record(record: UserBillingRecord) -> Self {
            let store = Self::new();
            store.records.lock().unwrap().push(record);
            store
        }

        pub fn failing() -> Self {
            Self {
                records: Mutex::new(Vec::new()),
                update_calls: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        pub fn records(&self) -> Vec<UserBillingRecord> {
            self.records.lock().unwrap().clone()
        }

        pub fn update_calls(&self) -> Vec<(UserIdentity, RecordPatch)> {
            self.update_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl UserRecordStore for MockRecordStore {
        async fn find_by_identity(
            &self,
            identity: &UserIdentity,
        ) -> Result<Option<UserBillingRecord>, StoreError> {
            if self.fail {
                return Err(StoreError::Database("simulated store failure".to_string()));
            }
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .find(|r| &r.identity == identity)
                .cloned())
        }

        async fn find_by_customer_id(
            &self,
            customer_id: &str,
        ) -> Result<Option<UserBillingRecord>, StoreError> {
            if self.fail {
                return Err(StoreError::Database("simulated store failure".to_string()));
            }
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.provider_customer_id.as_deref() == Some(customer_id))
                .cloned())
        }

        async fn update(
            &self,
            identity: &UserIdentity,
            patch: &RecordPatch,
        ) -> Result<UpdateOutcome, StoreError> {
            self.update_calls
                .lock()
                .unwrap()
                .push((identity.clone(), patch.clone()));
            if self.fail {
                return Err(StoreError::Database("simulated store failure".to_string()));
            }
            let mut records = self.records.lock().unwrap();
            match records.iter_mut().find(|r| &r.identity == identity) {
                Some(record) => {
                    patch.apply_to(record);
                    Ok(UpdateOutcome::Updated)
                }
                None => Ok(UpdateOutcome::NotFound),
            }
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // MockSnapshotCache
    // ════════════════════════════════════════════════════════════════════════════

    /// In-memory snapshot cache with a write counter.
    pub struct MockSnapshotCache {
        snapshot: Mutex<Snapshot>,
        writes: Mutex<usize>,
        fail_writes: bool,
    }

    impl MockSnapshotCache {
        pub fn new() -> Self {
            Self {
                snapshot: Mutex::new(Snapshot::new()),
                writes: Mutex::new(0),
                fail_writes: false,
            }
        }

        pub fn failing() -> Self {
            Self {
                snapshot: Mutex::new(Snapshot::new()),
                writes: Mutex::new(0),
                fail_writes: true,
            }
        }

        pub fn snapshot(&self) -> Snapshot {
            self.snapshot.lock().unwrap().clone()
        }

        pub fn write_count(&self) -> usize {
            *self.writes.lock().unwrap()
        }
    }

    #[async_trait]
    impl SnapshotCache for MockSnapshotCache {
        async fn read(&self) -> Snapshot {
            self.snapshot.lock().unwrap().clone()
        }

        async fn write(&self, snapshot: &Snapshot) -> Result<(), CacheError> {
            if self.fail_writes {
                return Err(CacheError::Io("simulated cache failure".to_string()));
            }
            *self.snapshot.lock().unwrap() = snapshot.clone();
            *self.writes.lock().unwrap() += 1;
            Ok(())
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // MockPaymentProvider
    // ════════════════════════════════════════════════════════════════════════════

    /// In-memory payment provider with seedable customers, subscriptions
    /// and checkout sessions, recording creation requests.
    pub struct MockPaymentProvider {
        customers: Mutex<Vec<ProviderCustomer>>,
        subscriptions: Mutex<Vec<ProviderSubscription>>,
        checkout_sessions: Mutex<Vec<ProviderCheckoutSession>>,
        create_customer_calls: Mutex<Vec<CreateCustomerRequest>>,
        checkout_requests: Mutex<Vec<CreateCheckoutRequest>>,
        portal_requests: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    impl MockPaymentProvider {
        pub fn new() -> Self {
            Self {
                customers: Mutex::new(Vec::new()),
                subscriptions: Mutex::new(Vec::new()),
                checkout_sessions: Mutex::new(Vec::new()),
                create_customer_calls: Mutex::new(Vec::new()),
                checkout_requests: Mutex::new(Vec::new()),
                portal_requests: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        pub fn failing() -> Self {
            let mut provider = Self::new();
            provider.fail = true;
            provider
        }

        pub fn with_customer(customer: ProviderCustomer) -> Self {
            let provider = Self::new();
            provider.customers.lock().unwrap().push(customer);
            provider
        }

        pub fn with_subscription(subscription: ProviderSubscription) -> Self {
            let provider = Self::new();
            provider.subscriptions.lock().unwrap().push(subscription);
            provider
        }

        pub fn with_checkout_session(session: ProviderCheckoutSession) -> Self {
            let provider = Self::new();
            provider.checkout_sessions.lock().unwrap().push(session);
            provider
        }

        pub fn add_customer(&self, customer: ProviderCustomer) {
            self.customers.lock().unwrap().push(customer);
        }

        pub fn add_subscription(&self, subscription: ProviderSubscription) {
            self.subscriptions.lock().unwrap().push(subscription);
        }

        pub fn create_customer_calls(&self) -> Vec<CreateCustomerRequest> {
            self.create_customer_calls.lock().unwrap().clone()
        }

        pub fn checkout_requests(&self) -> Vec<CreateCheckoutRequest> {
            self.checkout_requests.lock().unwrap().clone()
        }

        pub fn portal_requests(&self) -> Vec<(String, String)> {
            self.portal_requests.lock().unwrap().clone()
        }

        fn simulated_failure(&self) -> PaymentError {
            PaymentError::network("simulated provider failure")
        }
    }

    #[async_trait]
    impl PaymentProvider for MockPaymentProvider {
        async fn create_customer(
            &self,
            request: CreateCustomerRequest,
        ) -> Result<ProviderCustomer, PaymentError> {
            if self.fail {
                return Err(self.simulated_failure());
            }
            let mut calls = self.create_customer_calls.lock().unwrap();
            calls.push(request.clone());
            let customer = ProviderCustomer {
                id: format!("cus_mock_{}", calls.len()),
                email: request.email,
            };
            self.customers.lock().unwrap().push(customer.clone());
            Ok(customer)
        }

        async fn get_customer(
            &self,
            customer_id: &str,
        ) -> Result<Option<ProviderCustomer>, PaymentError> {
            if self.fail {
                return Err(self.simulated_failure());
            }
            Ok(self
                .customers
                .lock()
                .unwrap()
                .iter()
                .find(|c| c.id == customer_id)
                .cloned())
        }

        async fn search_customer_by_email(
            &self,
            email: &str,
        ) -> Result<Option<ProviderCustomer>, PaymentError> {
            if self.fail {
                return Err(self.simulated_failure());
            }
            Ok(self
                .customers
                .lock()
                .unwrap()
                .iter()
                .find(|c| c.email.as_deref() == Some(email))
                .cloned())
        }

        async fn get_subscription(
            &self,
            subscription_id: &str,
        ) -> Result<Option<ProviderSubscription>, PaymentError> {
            if self.fail {
                return Err(self.simulated_failure());
            }
            Ok(self
                .subscriptions
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.id == subscription_id)
                .cloned())
        }

        async fn get_checkout_session(
            &self,
            session_id: &str,
        ) -> Result<Option<ProviderCheckoutSession>, PaymentError> {
            if self.fail {
                return Err(self.simulated_failure());
            }
            Ok(self
                .checkout_sessions
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.id == session_id)
                .cloned())
        }

        async fn create_checkout_session(
            &self,
            request: CreateCheckoutRequest,
        ) -> Result<HostedSession, PaymentError> {
            if self.fail {
                return Err(self.simulated_failure());
            }
            self.checkout_requests.lock().unwrap().push(request);
            Ok(HostedSession {
                id: "cs_mock_1".to_string(),
                url: "https://checkout.example.com/c/cs_mock_1".to_string(),
            })
        }

        async fn create_portal_session(
            &self,
            customer_id: &str,
            return_url: &str,
        ) -> Result<HostedSession, PaymentError> {
            if self.fail {
                return Err(self.simulated_failure());
            }
            self.portal_requests
                .lock()
                .unwrap()
                .push((customer_id.to_string(), return_url.to_string()));
            Ok(HostedSession {
                id: "bps_mock_1".to_string(),
                url: "https://billing.example.com/p/bps_mock_1".to_string(),
            })
        }
    }
}
