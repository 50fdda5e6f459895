//! TTL Cache - A concurrent in-memory key/value cache
//!
//! Every entry carries a time-to-live and is removed by a background reaper
//! once it elapses. A key always lives for the TTL of its most recent write.

pub mod cache;
pub mod config;
pub mod error;
mod tasks;

pub use cache::{Cache, CacheStats};
pub use config::Config;
pub use error::{CacheError, Result};
