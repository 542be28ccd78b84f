//! Storage Adapters
//!
//! Implementation of the SnapshotCache port for the local file mirror.
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::FileSnapshotCache;
//!
//! let cache = FileSnapshotCache::new("./data/billing_cache.json");
//! ```

mod file_snapshot_cache;

pub use file_snapshot_cache::FileSnapshotCache;
