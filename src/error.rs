//! Error types for the cache
//!
//! Cache operations themselves never fail; errors only arise while building a cache.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache construction.
#[derive(Error, Debug)]
pub enum CacheError {
    /// No tokio runtime is available to host the reaper task
    #[error("No runtime: {0}")]
    NoRuntime(String),

    /// Configuration values are out of range
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
