//! In-process hourly rate limiting
//!
//! Each credential gets one atomic counter per fixed hourly window (windows
//! start on the hour, not at first use). Admission is a compare-and-swap on
//! the counter, so concurrent requests on the same credential never lose an
//! update and never over-admit past the budget. Persistence is asynchronous:
//! an admitted request spawns a store increment and never waits for it.
//!
//! Cold counters are seeded from the store so an admitted count survives a
//! process restart to the precision of the flushed writes. A background
//! sweeper drops counters for windows that have already closed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, warn};
use uuid::Uuid;

use pressgate_store::RateLimitStore;
use pressgate_types::RateLimitDecision;

/// Length of a rate-limit window in seconds.
pub const WINDOW_SECONDS: i64 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct WindowKey {
    credential: Uuid,
    window_start: i64,
}

/// Counts requests per credential per hourly window and admits or denies.
pub struct RateLimiter {
    counters: RwLock<HashMap<WindowKey, Arc<AtomicU64>>>,
    store: Arc<dyn RateLimitStore>,
    store_timeout: Duration,
}

impl RateLimiter {
    /// Create a limiter over a persistence store. `store_timeout` bounds the
    /// cold-counter seed read; the limiter itself is fail-open throughout.
    pub fn new(store: Arc<dyn RateLimitStore>, store_timeout: Duration) -> Self {
        Self { counters: RwLock::new(HashMap::new()), store, store_timeout }
    }

    /// Check and count one request for `credential` against an hourly budget.
    ///
    /// Admission increments the counter atomically; a denied request does not
    /// consume budget. The decision always carries the window metadata the
    /// response headers need, on denial as well as admission.
    pub async fn check(&self, credential: Uuid, limit: u32) -> RateLimitDecision {
        let now = Utc::now().timestamp();
        let window_start = now - now.rem_euclid(WINDOW_SECONDS);
        let reset_at = window_start + WINDOW_SECONDS;
        let key = WindowKey { credential, window_start };

        let counter = self.counter_for(key).await;

        // CAS admission: only counts strictly under the budget increment.
        let admitted = counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
                (count < u64::from(limit)).then_some(count + 1)
            })
            .is_ok();

        if admitted {
            let store = Arc::clone(&self.store);
            tokio::spawn(async move {
                if let Err(e) = store.increment_window(credential, window_start).await {
                    warn!(
                        credential = %credential,
                        window_start,
                        error = %e,
                        "Failed to persist rate-limit increment"
                    );
                }
            });
        }

        let count = counter.load(Ordering::SeqCst);
        RateLimitDecision {
            allowed: admitted,
            limit,
            remaining: u64::from(limit).saturating_sub(count) as u32,
            reset_at,
        }
    }

    /// Fetch or create the counter for a window, seeding cold windows from
    /// the store. Seed failures fall open to zero.
    async fn counter_for(&self, key: WindowKey) -> Arc<AtomicU64> {
        if let Some(counter) = self.read_counter(&key) {
            return counter;
        }

        let seed = match tokio::time::timeout(
            self.store_timeout,
            self.store.window_count(key.credential, key.window_start),
        )
        .await
        {
            Ok(Ok(count)) => count,
            Ok(Err(e)) => {
                warn!(credential = %key.credential, error = %e, "Rate-limit seed read failed, starting window at zero");
                0
            }
            Err(_) => {
                warn!(credential = %key.credential, "Rate-limit seed read timed out, starting window at zero");
                0
            }
        };

        // Two tasks may race the seed; the first insert wins and both use it.
        self.counters
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(key)
            .or_insert_with(|| Arc::new(AtomicU64::new(seed)))
            .clone()
    }

    fn read_counter(&self, key: &WindowKey) -> Option<Arc<AtomicU64>> {
        self.counters.read().unwrap_or_else(|e| e.into_inner()).get(key).cloned()
    }

    /// Drop counters whose window has already closed.
    ///
    /// Stale keys are collected under a read lock, then removed one
    /// write-lock acquisition per key so request admission is never blocked
    /// behind a long sweep.
    pub fn sweep(&self) {
        let now = Utc::now().timestamp();
        let current_window = now - now.rem_euclid(WINDOW_SECONDS);

        let stale: Vec<WindowKey> = self
            .counters
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .filter(|k| k.window_start < current_window)
            .copied()
            .collect();

        let count = stale.len();
        for key in stale {
            self.counters.write().unwrap_or_else(|e| e.into_inner()).remove(&key);
        }
        if count > 0 {
            debug!(swept = count, "Swept closed rate-limit windows");
        }
    }

    /// Spawn the background sweeper. Stops when `shutdown` flips to true.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => limiter.sweep(),
                    _ = shutdown.changed() => {
                        if *shutdown.borrow() {
                            debug!("Rate-limit sweeper shutting down");
                            break;
                        }
                    }
                }
            }
        })
    }

    #[cfg(test)]
    fn tracked_windows(&self) -> usize {
        self.counters.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}
