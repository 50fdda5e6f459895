//! Expiry Queue Module
//!
//! Min-heap of pending expirations ordered by deadline, drained by the reaper.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::Notify;
use tokio::time::Instant;

// == Expiration ==
/// A scheduled deletion of `key`, valid only while the key holds `generation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expiration {
    pub deadline: Instant,
    pub key: String,
    pub generation: u64,
}

impl Ord for Expiration {
    fn cmp(&self, other: &Self) -> Ordering {
        self.deadline
            .cmp(&other.deadline)
            .then_with(|| self.generation.cmp(&other.generation))
            .then_with(|| self.key.cmp(&other.key))
    }
}

impl PartialOrd for Expiration {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// == Expiry Queue ==
/// Pending expirations plus the signal used to wake the reaper.
#[derive(Debug, Default)]
pub struct ExpiryQueue {
    heap: Mutex<BinaryHeap<Reverse<Expiration>>>,
    wakeup: Notify,
}

impl ExpiryQueue {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Arm ==
    /// Schedules deletion of `key` at `generation` once `deadline` passes.
    ///
    /// The reaper is woken when the new deadline becomes the earliest one.
    pub fn arm_at(&self, key: String, generation: u64, deadline: Instant) {
        let earliest = {
            let mut heap = self.lock();
            let earliest = heap
                .peek()
                .map_or(true, |Reverse(head)| deadline < head.deadline);
            heap.push(Reverse(Expiration {
                deadline,
                key,
                generation,
            }));
            earliest
        };

        if earliest {
            self.wakeup.notify_one();
        }
    }

    // == Pop Due ==
    /// Removes up to `limit` expirations whose deadline is at or before `now`.
    pub fn pop_due(&self, now: Instant, limit: usize) -> Vec<Expiration> {
        let mut heap = self.lock();
        let mut due = Vec::new();

        while due.len() < limit {
            let is_due = heap
                .peek()
                .is_some_and(|Reverse(head)| head.deadline <= now);
            if !is_due {
                break;
            }
            if let Some(Reverse(expiration)) = heap.pop() {
                due.push(expiration);
            }
        }

        due
    }

    // == Retain ==
    /// Keeps only the expirations for which `keep` returns true.
    ///
    /// Returns the number of expirations dropped.
    pub fn retain(&self, mut keep: impl FnMut(&Expiration) -> bool) -> usize {
        let mut heap = self.lock();
        let before = heap.len();
        heap.retain(|Reverse(expiration)| keep(expiration));
        before - heap.len()
    }

    // == Next Deadline ==
    /// Returns the earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.lock().peek().map(|Reverse(head)| head.deadline)
    }

    // == Wait ==
    /// Resolves when a new earliest deadline is armed or the queue is cleared.
    pub async fn notified(&self) {
        self.wakeup.notified().await;
    }

    // == Clear ==
    /// Drops every pending expiration.
    pub fn clear(&self) {
        self.lock().clear();
        self.wakeup.notify_one();
    }

    // == Length ==
    /// Returns the number of pending expirations, stale ones included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, BinaryHeap<Reverse<Expiration>>> {
        // A panic while holding the lock cannot leave the heap half-updated.
        self.heap.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
