//! Cache Store Module
//!
//! Concurrent key/value storage built on a sharded map. Every primitive is
//! atomic per key; callers never lock anything themselves.
//!
//! A slot past its deadline is treated as absent by every lookup, even before
//! the reaper has physically removed it.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

use crate::cache::Slot;

// == Store ==
/// Concurrent map from key to [`Slot`].
#[derive(Debug)]
pub struct Store<V> {
    /// Key-value storage
    slots: DashMap<String, Slot<V>>,
}

impl<V: Clone> Store<V> {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }

    // == Load ==
    /// Returns a clone of the value stored under `key`.
    pub fn load(&self, key: &str) -> Option<V> {
        self.slots
            .get(key)
            .filter(|slot| !slot.is_expired())
            .map(|slot| slot.value.clone())
    }

    // == Store ==
    /// Unconditionally inserts or replaces the value for `key`.
    pub fn store(&self, key: String, value: V, generation: u64, expires_at: Instant) {
        self.slots.insert(key, Slot::new(value, generation, expires_at));
    }

    // == Load Or Store ==
    /// Inserts `value` if `key` is absent.
    ///
    /// Returns `(value, false)` when inserted, `(existing, true)` otherwise.
    /// The decision is made while holding the key's shard lock. An expired
    /// slot is replaced as if the key were absent.
    pub fn load_or_store(
        &self,
        key: String,
        value: V,
        generation: u64,
        expires_at: Instant,
    ) -> (V, bool) {
        match self.slots.entry(key) {
            Entry::Occupied(occupied) if !occupied.get().is_expired() => {
                (occupied.get().value.clone(), true)
            }
            Entry::Occupied(mut occupied) => {
                occupied.insert(Slot::new(value.clone(), generation, expires_at));
                (value, false)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Slot::new(value.clone(), generation, expires_at));
                (value, false)
            }
        }
    }

    // == Load And Delete ==
    /// Removes `key`, returning the value it held.
    pub fn load_and_delete(&self, key: &str) -> Option<V> {
        self.slots
            .remove(key)
            .filter(|(_, slot)| !slot.is_expired())
            .map(|(_, slot)| slot.value)
    }

    // == Renew ==
    /// Re-stamps a present slot with a new generation and deadline.
    ///
    /// Returns false if `key` is absent.
    pub fn renew(&self, key: &str, generation: u64, expires_at: Instant) -> bool {
        match self.slots.get_mut(key) {
            Some(mut slot) if !slot.is_expired() => {
                slot.generation = generation;
                slot.expires_at = expires_at;
                true
            }
            _ => false,
        }
    }

    // == Delete If Generation ==
    /// Removes `key` only if its slot still carries `generation`.
    pub fn delete_if_generation(&self, key: &str, generation: u64) -> bool {
        self.slots
            .remove_if(key, |_, slot| slot.generation == generation)
            .is_some()
    }

    // == Current Generation ==
    /// Returns the generation of the slot under `key`, expired or not.
    pub fn current_generation(&self, key: &str) -> Option<u64> {
        self.slots.get(key).map(|slot| slot.generation)
    }

    // == Time To Live ==
    /// Returns how long the slot under `key` has left.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        self.slots
            .get(key)
            .filter(|slot| !slot.is_expired())
            .map(|slot| slot.ttl_remaining())
    }

    // == Cleanup Expired ==
    /// Removes every slot past its deadline.
    ///
    /// Returns the number of slots removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut removed = 0;
        self.slots.retain(|_, slot| {
            let live = !slot.is_expired();
            if !live {
                removed += 1;
            }
            live
        });
        removed
    }

    // == Clear ==
    /// Empties the store shard by shard.
    pub fn clear(&self) {
        self.slots.clear();
    }

    // == Length ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    // == Is Empty ==
    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<V: Clone> Default for Store<V> {
    fn default() -> Self {
        Self::new()
    }
}
