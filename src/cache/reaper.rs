//! Background sweeper that evicts expired cache entries
//!
//! The reaper wakes once per TTL, takes the store's write lock, drops every entry
//! older than the TTL and goes back to sleep. It stops when the owning cache
//! closes or drops the shutdown channel.

use std::collections::HashMap;
use std::future;
use std::sync::RwLock;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, warn};

use super::store::{write_entries, CacheEntry, EntryStore};

/// Handle for stopping the background reaper task
#[derive(Debug)]
pub(super) struct ReaperHandle {
    /// Signals the task to stop; dropping it has the same effect
    shutdown_tx: mpsc::Sender<()>,
    /// The spawned sweep loop
    task: JoinHandle<()>,
}

impl ReaperHandle {
    /// Spawns the sweep loop for `entries`.
    ///
    /// The first sweep happens one `ttl` after this call, then every `ttl`. A
    /// `ttl` so large that two periods overflow the clock never sweeps: no
    /// entry can outlive it, so the task only waits for shutdown.
    pub(super) fn spawn(entries: EntryStore, ttl: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let mut interval = first_sweep_at(Instant::now(), ttl).map(|start| {
            let mut interval = time::interval_at(start, ttl);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        if interval.is_none() {
            debug!(?ttl, "ttl exceeds the clock range, reaper will not sweep");
        }

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = next_tick(&mut interval) => {
                        let removed = sweep(&entries, ttl, Instant::now());
                        if removed > 0 {
                            debug!(removed, "reaper evicted expired entries");
                        }
                    }
                    // Fires on an explicit signal or when the sender is dropped
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }
            debug!("reaper stopped");
        });

        Self { shutdown_tx, task }
    }

    /// Signals the reaper to stop and waits for the task to finish
    pub(super) async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;

        if let Err(err) = self.task.await {
            warn!(error = %err, "reaper task ended abnormally");
        }
    }
}

/// When the first sweep is due, or `None` if `now + 2 * ttl` overflows.
///
/// The interval keeps adding `ttl` to its deadline, so two periods must fit.
fn first_sweep_at(now: Instant, ttl: Duration) -> Option<Instant> {
    let two_periods = ttl.checked_mul(2)?;
    now.checked_add(two_periods)?;
    now.checked_add(ttl)
}

/// Waits for the next sweep, or forever when sweeping is disabled
async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => future::pending::<()>().await,
    }
}

/// Removes every entry whose age at `now` exceeds `ttl`.
///
/// Holds the write lock for the whole scan. Returns the number of entries removed.
pub(super) fn sweep(
    entries: &RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    now: Instant,
) -> usize {
    let mut entries = write_entries(entries);
    let before = entries.len();
    entries.retain(|_, entry| now.saturating_duration_since(entry.created_at) <= ttl);
    before - entries.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const TTL: Duration = Duration::from_millis(100);

    fn store_with(entries: &[(&str, Instant)]) -> EntryStore {
        let map = entries
            .iter()
            .map(|(key, created_at)| {
                (
                    key.to_string(),
                    CacheEntry {
                        value: key.as_bytes().to_vec(),
                        created_at: *created_at,
                    },
                )
            })
            .collect();
        Arc::new(RwLock::new(map))
    }

    #[test]
    fn test_sweep_removes_only_entries_older_than_ttl() {
        let base = Instant::now();
        let store = store_with(&[
            ("old", base),
            ("fresh", base + Duration::from_millis(80)),
        ]);

        let removed = sweep(&store, TTL, base + Duration::from_millis(150));

        assert_eq!(removed, 1);
        let entries = store.read().unwrap();
        assert!(!entries.contains_key("old"));
        assert!(entries.contains_key("fresh"));
    }

    #[test]
    fn test_sweep_keeps_entry_exactly_at_ttl() {
        let base = Instant::now();
        let store = store_with(&[("edge", base)]);

        let removed = sweep(&store, TTL, base + TTL);

        assert_eq!(removed, 0, "an entry is expired only once its age exceeds the ttl");
        assert!(store.read().unwrap().contains_key("edge"));
    }

    #[test]
    fn test_sweep_on_empty_store() {
        let store = store_with(&[]);
        assert_eq!(sweep(&store, TTL, Instant::now()), 0);
    }

    #[test]
    fn test_sweep_tolerates_entries_newer_than_now() {
        let base = Instant::now();
        let store = store_with(&[("future", base + Duration::from_secs(1))]);

        assert_eq!(sweep(&store, TTL, base), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reaper_first_sweep_waits_one_ttl() {
        let base = Instant::now();
        let store = store_with(&[("stale", base)]);
        let handle = ReaperHandle::spawn(Arc::clone(&store), TTL);

        // No sweep has run yet
        time::sleep(Duration::from_millis(50)).await;
        assert!(store.read().unwrap().contains_key("stale"));

        time::sleep(Duration::from_millis(200)).await;
        assert!(store.read().unwrap().is_empty());

        handle.shutdown().await;
    }

    #[test]
    fn test_first_sweep_is_one_ttl_out() {
        let now = Instant::now();
        assert_eq!(first_sweep_at(now, TTL), Some(now + TTL));
    }

    #[test]
    fn test_first_sweep_overflow_disables_sweeping() {
        let now = Instant::now();
        assert_eq!(first_sweep_at(now, Duration::MAX), None);
        assert_eq!(first_sweep_at(now, Duration::from_secs(u64::MAX)), None);
        assert_eq!(first_sweep_at(now, Duration::MAX / 2 + Duration::from_secs(1)), None);
    }

    #[tokio::test]
    async fn test_huge_ttl_spawns_and_shuts_down() {
        let base = Instant::now();
        let store = store_with(&[("kept", base)]);
        let handle = ReaperHandle::spawn(Arc::clone(&store), Duration::from_secs(u64::MAX));

        tokio::task::yield_now().await;
        assert!(store.read().unwrap().contains_key("kept"));

        handle.shutdown().await;
        assert_eq!(Arc::strong_count(&store), 1);
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_task_exit() {
        let store = store_with(&[]);
        let handle = ReaperHandle::spawn(Arc::clone(&store), Duration::from_secs(60));

        handle.shutdown().await;

        assert_eq!(Arc::strong_count(&store), 1);
    }
}
