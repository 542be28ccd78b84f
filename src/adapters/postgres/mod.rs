//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresUserRecordStore` - Authoritative billing record store

mod user_record_store;

pub use user_record_store::PostgresUserRecordStore;
