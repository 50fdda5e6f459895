//! Cache Handle Module
//!
//! The public [`Cache`] type: composes the store, the expiry queue and the
//! reaper task behind the set/get/expire operations.
//!
//! Every write draws a fresh generation from a cache-wide counter and tags both
//! the stored slot and its scheduled expiration with it. The reaper only deletes
//! a key whose slot still carries the expiration's generation, so a key always
//! lives for the TTL of its most recent write.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::cache::entry::deadline_after;
use crate::cache::{CacheStats, ExpiryQueue, StatsRecorder, Store};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::tasks::spawn_reaper;

/// Superseded expirations tolerated beyond twice the entry count before the
/// queue is compacted.
const COMPACTION_SLACK: usize = 64;

// == Shared State ==
/// State shared between cache handles and the reaper task.
#[derive(Debug)]
pub(crate) struct Shared<V> {
    pub(crate) store: Store<V>,
    pub(crate) queue: ExpiryQueue,
    pub(crate) stats: StatsRecorder,
    generation: AtomicU64,
    running: AtomicBool,
}

impl<V: Clone> Shared<V> {
    pub(crate) fn new() -> Self {
        Self {
            store: Store::new(),
            queue: ExpiryQueue::new(),
            stats: StatsRecorder::new(),
            generation: AtomicU64::new(0),
            running: AtomicBool::new(true),
        }
    }

    /// Returns a generation never handed out before.
    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Queues an expiration unless the reaper has been stopped.
    fn arm(&self, key: String, generation: u64, deadline: Instant) {
        if !self.running.load(Ordering::Acquire) {
            return;
        }
        self.queue.arm_at(key, generation, deadline);

        // A shutdown that cleared the queue before the push would leave it behind.
        if !self.running.load(Ordering::Acquire) {
            self.queue.clear();
            return;
        }

        if self.queue.len() > 2 * self.store.len() + COMPACTION_SLACK {
            self.compact();
        }
    }

    /// Drops queued expirations that no longer match the slot under their key.
    fn compact(&self) -> usize {
        let dropped = self.queue.retain(|expiration| {
            self.store.current_generation(&expiration.key) == Some(expiration.generation)
        });
        debug!("Expiry queue compacted: dropped {} superseded expirations", dropped);
        dropped
    }
}

struct Inner<V> {
    shared: Arc<Shared<V>>,
    reaper: Mutex<Option<JoinHandle<()>>>,
}

impl<V> Drop for Inner<V> {
    fn drop(&mut self) {
        let reaper = match self.reaper.get_mut() {
            Ok(reaper) => reaper,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(handle) = reaper.take() {
            handle.abort();
        }
    }
}

// == Cache ==
/// Concurrent key/value cache whose entries expire after a per-write TTL.
///
/// Cloning a `Cache` yields another handle to the same entries. The background
/// reaper stops on [`Cache::shutdown`] or when the last handle is dropped.
///
/// # Example
/// ```no_run
/// # async fn demo() -> ttl_cache::error::Result<()> {
/// use std::time::Duration;
/// use ttl_cache::Cache;
///
/// let cache = Cache::new()?;
/// cache.set("answer", 42, Duration::from_secs(60));
/// assert_eq!(cache.get("answer"), Some(42));
/// # Ok(())
/// # }
/// ```
pub struct Cache<V> {
    inner: Arc<Inner<V>>,
}

impl<V> Clone for Cache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> Cache<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructors ==
    /// Creates a cache with the default configuration.
    ///
    /// Must be called from within a tokio runtime, which hosts the reaper task.
    pub fn new() -> Result<Self> {
        Self::with_config(&Config::default())
    }

    /// Creates a cache from the given configuration.
    pub fn with_config(config: &Config) -> Result<Self> {
        config.validate()?;
        tokio::runtime::Handle::try_current()
            .map_err(|e| CacheError::NoRuntime(e.to_string()))?;

        let shared = Arc::new(Shared::new());
        let reaper = spawn_reaper(Arc::clone(&shared), config.reaper_batch);
        debug!(reaper_batch = config.reaper_batch, "Cache created");

        Ok(Self {
            inner: Arc::new(Inner {
                shared,
                reaper: Mutex::new(Some(reaper)),
            }),
        })
    }

    fn shared(&self) -> &Shared<V> {
        &self.inner.shared
    }

    // == Set ==
    /// Stores `value` under `key`, replacing any prior value, and schedules
    /// its removal after `ttl`.
    ///
    /// Expirations scheduled by earlier writes of the same key no longer apply.
    /// A zero `ttl` removes the entry as soon as the reaper runs.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let shared = self.shared();
        let key = key.into();
        let generation = shared.next_generation();
        let deadline = deadline_after(ttl);

        shared.store.store(key.clone(), value, generation, deadline);
        shared.arm(key, generation, deadline);
    }

    // == Get Or Set ==
    /// Returns the existing value for `key`, or stores `value` with `ttl`.
    ///
    /// The second result is true if the value was already present. Only the
    /// inserting call schedules an expiration.
    pub fn get_or_set(&self, key: impl Into<String>, value: V, ttl: Duration) -> (V, bool) {
        let shared = self.shared();
        let key = key.into();
        let generation = shared.next_generation();
        let deadline = deadline_after(ttl);

        let (actual, loaded) = shared
            .store
            .load_or_store(key.clone(), value, generation, deadline);
        if !loaded {
            shared.arm(key, generation, deadline);
        }

        (actual, loaded)
    }

    // == Get ==
    /// Returns the value stored under `key`, without touching its TTL.
    pub fn get(&self, key: &str) -> Option<V> {
        let shared = self.shared();
        let value = shared.store.load(key);

        match value {
            Some(_) => shared.stats.record_hit(),
            None => shared.stats.record_miss(),
        }

        value
    }

    // == Expire ==
    /// Removes `key` immediately, returning the value it held.
    pub fn expire(&self, key: &str) -> Option<V> {
        self.shared().store.load_and_delete(key)
    }

    // == Refresh ==
    /// Gives a present `key` a fresh `ttl`, keeping its value.
    ///
    /// Returns false and does nothing if the key is absent.
    pub fn refresh(&self, key: &str, ttl: Duration) -> bool {
        let shared = self.shared();
        let generation = shared.next_generation();
        let deadline = deadline_after(ttl);

        if !shared.store.renew(key, generation, deadline) {
            return false;
        }

        shared.arm(key.to_string(), generation, deadline);
        true
    }

    // == Expire All ==
    /// Removes every entry.
    pub fn expire_all(&self) {
        let shared = self.shared();
        // Queue first: a write racing with the clear either survives with its
        // expiration queued, or is wiped by the store clear.
        shared.queue.clear();
        shared.store.clear();
        debug!("All entries expired");
    }

    // == Time To Live ==
    /// Returns how long `key` has left before it expires.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        self.shared().store.ttl_remaining(key)
    }

    // == Purge Expired ==
    /// Removes every entry whose TTL has elapsed, leaving live entries alone.
    ///
    /// The reaper does this continuously; this reclaims memory when it is
    /// behind or has been shut down. Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        let shared = self.shared();
        let removed = shared.store.cleanup_expired();
        if removed > 0 {
            shared.stats.record_expirations(removed as u64);
            info!("Purged {} expired entries", removed);
        }
        removed
    }

    // == Length ==
    /// Returns the number of stored entries, including expired ones the reaper
    /// has not removed yet (see [`Cache::purge_expired`]).
    pub fn len(&self) -> usize {
        self.shared().store.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.shared().store.is_empty()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let shared = self.shared();
        shared
            .stats
            .snapshot(shared.store.len(), shared.queue.len())
    }

    // == Shutdown ==
    /// Stops the reaper and drops every scheduled expiration.
    ///
    /// Entries stay readable until their deadline but are no longer removed
    /// from memory automatically. Calling this more than once is a no-op.
    pub fn shutdown(&self) {
        let shared = self.shared();
        if !shared.running.swap(false, Ordering::AcqRel) {
            return;
        }

        let reaper = match self.inner.reaper.lock() {
            Ok(mut reaper) => reaper.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = reaper {
            handle.abort();
        }

        shared.queue.clear();
        info!("Cache reaper stopped");
    }

    /// Returns true until [`Cache::shutdown`] has been called.
    pub fn is_running(&self) -> bool {
        self.shared().running.load(Ordering::Acquire)
    }
}
