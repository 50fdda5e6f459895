//! Configuration Module
//!
//! Handles loading cache and demo settings from environment variables.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Cache and demo configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of expirations the reaper handles per pass
    pub reaper_batch: usize,
    /// Long-lived demo entry TTL in seconds
    pub demo_long_ttl: u64,
    /// Short-lived demo entry TTL in seconds
    pub demo_short_ttl: u64,
    /// How long the demo waits before looking the short-lived entry up again, in seconds
    pub demo_wait: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_REAPER_BATCH` - Expirations per reaper pass (default: 1024)
    /// - `DEMO_LONG_TTL` - Long demo TTL in seconds (default: 300)
    /// - `DEMO_SHORT_TTL` - Short demo TTL in seconds (default: 10)
    /// - `DEMO_WAIT` - Demo wait in seconds (default: 15)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            reaper_batch: parse_var("CACHE_REAPER_BATCH").unwrap_or(defaults.reaper_batch),
            demo_long_ttl: parse_var("DEMO_LONG_TTL").unwrap_or(defaults.demo_long_ttl),
            demo_short_ttl: parse_var("DEMO_SHORT_TTL").unwrap_or(defaults.demo_short_ttl),
            demo_wait: parse_var("DEMO_WAIT").unwrap_or(defaults.demo_wait),
        }
    }

    /// Checks that the configuration can drive a cache.
    pub fn validate(&self) -> Result<()> {
        if self.reaper_batch == 0 {
            return Err(CacheError::InvalidConfig(
                "reaper_batch must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn long_ttl(&self) -> Duration {
        Duration::from_secs(self.demo_long_ttl)
    }

    pub fn short_ttl(&self) -> Duration {
        Duration::from_secs(self.demo_short_ttl)
    }

    pub fn wait(&self) -> Duration {
        Duration::from_secs(self.demo_wait)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reaper_batch: 1024,
            demo_long_ttl: 300,
            demo_short_ttl: 10,
            demo_wait: 15,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
