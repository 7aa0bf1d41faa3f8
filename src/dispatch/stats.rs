//! Dispatch counters.
//!
//! [`DispatchStats`] is the dispatcher's lock-free counter block;
//! [`StatsSnapshot`] is the immutable view handed to callers.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::Duration;

/// Lock-free dispatch counters.
#[derive(Debug, Default)]
pub(crate) struct DispatchStats {
    published: AtomicU64,
    processed: AtomicU64,
    failed: AtomicU64,
    dead_lettered: AtomicU64,
    dispatch_nanos: AtomicU64,
}

impl DispatchStats {
    /// Records one fully dispatched event and its wall-clock duration.
    pub(crate) fn record_published(&self, elapsed: Duration) {
        self.published.fetch_add(1, AtomicOrdering::Relaxed);
        let nanos = elapsed.as_nanos().min(u128::from(u64::MAX)) as u64;
        self.dispatch_nanos.fetch_add(nanos, AtomicOrdering::Relaxed);
    }

    /// Records one successful handler invocation.
    pub(crate) fn record_processed(&self) {
        self.processed.fetch_add(1, AtomicOrdering::Relaxed);
    }

    /// Records one subscription that failed terminally.
    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, AtomicOrdering::Relaxed);
    }

    /// Records one dead-letter event synthesized.
    pub(crate) fn record_dead_lettered(&self) {
        self.dead_lettered.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        let published = self.published.load(AtomicOrdering::Relaxed);
        let total_nanos = self.dispatch_nanos.load(AtomicOrdering::Relaxed);
        let avg_processing_time = if published == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(total_nanos / published)
        };
        StatsSnapshot {
            events_published: published,
            events_processed: self.processed.load(AtomicOrdering::Relaxed),
            events_failed: self.failed.load(AtomicOrdering::Relaxed),
            events_dead_lettered: self.dead_lettered.load(AtomicOrdering::Relaxed),
            avg_processing_time,
        }
    }
}

/// Point-in-time view of the dispatcher's counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Events fully dispatched (dead-letter events included).
    pub events_published: u64,
    /// Successful handler invocations.
    pub events_processed: u64,
    /// Subscriptions that failed after exhausting their retries.
    pub events_failed: u64,
    /// Dead-letter events synthesized.
    pub events_dead_lettered: u64,
    /// Mean wall-clock duration of a full dispatch, over all published events.
    pub avg_processing_time: Duration,
}
