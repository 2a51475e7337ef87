use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;

use crate::Clock;
use crate::common::{LimitResult, Policy, millis_to_system_time};

/// One live counter window. `total` and `duration_ms` are the parameters of
/// the rung that was active when the window was seeded; a window in flight is
/// never reparameterized, even if the ladder advances underneath it.
struct CounterEntry {
    count: i64,
    total: i64,
    duration_ms: u64,
    expire_ms: u64,
}

/// Ladder position for an identifier. Absent or expired means rung 0.
struct StatusEntry {
    index: usize,
    expire_ms: u64,
}

#[derive(Default)]
struct Store {
    counters: HashMap<String, CounterEntry>,
    status: HashMap<String, StatusEntry>,
}

impl Store {
    fn sweep(&mut self, now: u64) -> usize {
        let before = self.counters.len() + self.status.len();
        self.counters.retain(|_, entry| entry.expire_ms > now);
        self.status.retain(|_, entry| entry.expire_ms > now);
        before - (self.counters.len() + self.status.len())
    }
}

/// In-process rate limiter.
///
/// Both maps live behind one mutex: escalation writes the status entry in the
/// same critical section that charged the counter, so concurrent callers on
/// one identifier observe a linearizable ladder.
pub struct LocalRateLimiter {
    store: Arc<Mutex<Store>>,
    clock: Arc<dyn Clock>,
    stop: Arc<Notify>,
}

impl LocalRateLimiter {
    pub(crate) fn new(clean_duration: Duration, clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(Mutex::new(Store::default()));
        let stop = Arc::new(Notify::new());

        spawn_sweeper(&store, clock.clone(), clean_duration, stop.clone());

        Self { store, clock, stop }
    } // end constructor

    /// Charge one call against `id` and report the window state.
    pub(crate) fn get_limit(&self, id: &str, policy: &Policy) -> LimitResult {
        let now = self.clock.now_millis();
        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        let store = &mut *store;

        let rung_index = match store.status.get(id) {
            Some(status) if status.expire_ms > now => policy.clamp_index(status.index),
            Some(_) => {
                store.status.remove(id);
                0
            }
            None => 0,
        };

        match store.counters.get_mut(id) {
            Some(entry) if entry.expire_ms > now => {
                entry.count += 1;
                let remaining = (entry.total - entry.count).max(-1);

                // First overflow of this window: advance the ladder. The new
                // rung takes effect only once this window expires; the status
                // TTL is twice the window that was just exceeded.
                if entry.count == entry.total + 1 && policy.len() > 1 {
                    store.status.insert(
                        id.to_string(),
                        StatusEntry {
                            index: policy.clamp_index(rung_index + 1),
                            expire_ms: now + entry.duration_ms.saturating_mul(2),
                        },
                    );
                }

                LimitResult {
                    total: entry.total,
                    remaining,
                    duration: Duration::from_millis(entry.duration_ms),
                    reset: millis_to_system_time(entry.expire_ms),
                }
            }
            _ => {
                let rung = policy.rung(rung_index);
                let expire_ms = now + rung.window_ms();

                store.counters.insert(
                    id.to_string(),
                    CounterEntry {
                        count: 1,
                        total: rung.quota,
                        duration_ms: rung.window_ms(),
                        expire_ms,
                    },
                );

                LimitResult {
                    total: rung.quota,
                    remaining: rung.quota - 1,
                    duration: rung.window,
                    reset: millis_to_system_time(expire_ms),
                }
            }
        }
    } // end method get_limit

    /// Drop both entries for `id`. The next `get_limit` starts fresh.
    pub(crate) fn remove(&self, id: &str) {
        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        store.counters.remove(id);
        store.status.remove(id);
    }

    /// Stop the background sweeper. Idempotent.
    pub(crate) fn shutdown(&self) {
        self.stop.notify_one();
    }

    #[cfg(test)]
    pub(crate) fn entry_counts(&self) -> (usize, usize) {
        let store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        (store.counters.len(), store.status.len())
    }
}

impl Drop for LocalRateLimiter {
    fn drop(&mut self) {
        self.stop.notify_one();
    }
}

fn spawn_sweeper(
    store: &Arc<Mutex<Store>>,
    clock: Arc<dyn Clock>,
    clean_duration: Duration,
    stop: Arc<Notify>,
) {
    let store = Arc::downgrade(store);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(clean_duration);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = stop.notified() => break,
                _ = ticker.tick() => {
                    let Some(store) = store.upgrade() else {
                        break;
                    };

                    let now = clock.now_millis();
                    let removed = store
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .sweep(now);

                    if removed > 0 {
                        tracing::debug!(removed, "swept expired rate limit entries");
                    }
                }
            }
        }
    });
} // end sweeper
