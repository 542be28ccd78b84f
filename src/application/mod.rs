//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Following CQRS, it separates command handlers (write) from query handlers (read).

pub mod handlers;

pub use handlers::billing::{
    // Commands
    ConfirmSessionCommand, ConfirmSessionHandler, ConfirmSessionResult,
    CreateCheckoutSessionCommand, CreateCheckoutSessionHandler,
    CreatePortalSessionCommand, CreatePortalSessionHandler,
    ProcessAppleWebhookCommand, ProcessAppleWebhookHandler,
    ProcessWebhookCommand, ProcessWebhookHandler, ProcessWebhookResult,
    // Queries
    GetStatusHandler, GetStatusQuery, GetStatusResult,
    // Shared building blocks
    BillingRequestError, CustomerProvisioner, IdentityResolver, RecordWriter,
};
