//! Cache Module
//!
//! Provides the concurrent key/value store, the expiry queue and the
//! [`Cache`] handle that composes them.

mod entry;
mod expiry;
mod handle;
mod stats;
mod store;


// Re-export public types
pub use entry::Slot;
pub use handle::Cache;
pub use stats::CacheStats;
pub use store::Store;

pub(crate) use expiry::ExpiryQueue;
pub(crate) use handle::Shared;
pub(crate) use stats::StatsRecorder;
