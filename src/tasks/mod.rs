//! Background Tasks Module
//!
//! Contains the tasks that run alongside the cache.
//!
//! # Tasks
//! - Expiration reaper: removes entries as their TTL elapses

mod reaper;

pub(crate) use reaper::spawn_reaper;

#[cfg(test)]
pub(crate) use reaper::reap_due;
