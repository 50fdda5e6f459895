//! Expiration Reaper Task
//!
//! Background task that removes entries once their TTL has elapsed.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::cache::Shared;

/// Outcome of a single reaper pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ReapOutcome {
    /// Expirations taken off the queue
    pub processed: usize,
    /// Entries actually removed; the rest were superseded by a later write
    pub removed: usize,
}

/// Processes up to `batch` expirations that are due now.
///
/// An expiration only removes its key if the slot still carries the
/// generation it was armed with.
pub(crate) fn reap_due<V: Clone>(shared: &Shared<V>, batch: usize) -> ReapOutcome {
    let due = shared.queue.pop_due(Instant::now(), batch);

    let removed = due
        .iter()
        .filter(|expiration| {
            shared
                .store
                .delete_if_generation(&expiration.key, expiration.generation)
        })
        .count();

    if removed > 0 {
        shared.stats.record_expirations(removed as u64);
    }

    ReapOutcome {
        processed: due.len(),
        removed,
    }
}

/// Logs a pass; empty passes after a spurious wakeup stay silent.
fn report(outcome: ReapOutcome) {
    if outcome.removed > 0 {
        info!(
            "Expiration reaper: removed {} entries ({} stale expirations skipped)",
            outcome.removed,
            outcome.processed - outcome.removed
        );
    } else if outcome.processed > 0 {
        debug!(
            "Expiration reaper: {} stale expirations skipped",
            outcome.processed
        );
    }
}

/// Spawns the task that evicts entries as their deadlines pass.
///
/// The task sleeps until the earliest queued deadline and wakes early when a
/// sooner one is armed. It runs until the returned handle is aborted.
///
/// # Arguments
/// * `shared` - state shared with the cache handles
/// * `batch` - maximum number of expirations handled before yielding
pub(crate) fn spawn_reaper<V>(shared: Arc<Shared<V>>, batch: usize) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!("Starting expiration reaper with batch size {}", batch);

        loop {
            match shared.queue.next_deadline() {
                None => {
                    shared.queue.notified().await;
                    continue;
                }
                Some(deadline) if deadline > Instant::now() => {
                    tokio::select! {
                        _ = tokio::time::sleep_until(deadline) => {}
                        _ = shared.queue.notified() => continue,
                    }
                }
                Some(_) => {}
            }

            let outcome = reap_due(&shared, batch);
            report(outcome);

            if outcome.processed == batch {
                tokio::task::yield_now().await;
            }
        }
    })
}
