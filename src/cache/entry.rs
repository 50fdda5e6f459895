//! Cache Entry Module
//!
//! Defines the slot stored under each key: the value plus the write that produced it.

use std::time::Duration;

use tokio::time::Instant;

// == Slot ==
/// A stored value tagged with the generation of the write that produced it.
#[derive(Debug, Clone)]
pub struct Slot<V> {
    /// The stored value
    pub value: V,
    /// Generation of the write (or refresh) that produced this slot
    pub generation: u64,
    /// Instant after which the reaper removes this slot
    pub expires_at: Instant,
}

impl<V> Slot<V> {
    // == Constructor ==
    /// Creates a new slot.
    pub fn new(value: V, generation: u64, expires_at: Instant) -> Self {
        Self {
            value,
            generation,
            expires_at,
        }
    }

    // == Is Expired ==
    /// Checks whether the deadline has been reached.
    ///
    /// A slot is expired when the current time is greater than or equal to
    /// its deadline, even if the reaper has not removed it yet.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, saturating at zero.
    pub fn ttl_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

// == Deadline ==
/// Computes the deadline `ttl` from now, saturating far in the future on overflow.
pub fn deadline_after(ttl: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(ttl)
        .unwrap_or_else(|| now + Duration::from_secs(60 * 60 * 24 * 365 * 30))
}
