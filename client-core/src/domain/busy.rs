//! Global busy indicator backed by a clamped counter.
//!
//! Concurrent operations each register interest; the indicator shows while
//! any remain outstanding. A boolean flag cannot express overlap: the first
//! operation to finish would hide the indicator while others still run.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counter of outstanding long-running operations.
#[derive(Debug, Default)]
pub struct BusyTracker {
    outstanding: AtomicU64,
}

impl BusyTracker {
    /// Create an idle tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the start of an operation.
    pub fn begin(&self) {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
    }

    /// Register the end of an operation. Clamped at zero: an unmatched
    /// `end` is logged and ignored rather than underflowing into a
    /// permanently-busy counter.
    pub fn end(&self) {
        let result = self
            .outstanding
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
                count.checked_sub(1)
            });
        if result.is_err() {
            tracing::warn!("busy tracker ended without a matching begin");
        }
    }

    /// True while any operation is outstanding.
    pub fn is_busy(&self) -> bool {
        self.pending() > 0
    }

    /// Number of outstanding operations.
    pub fn pending(&self) -> u64 {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Begin an operation and end it when the guard drops, keeping the
    /// pair matched across early returns.
    pub fn scope(&self) -> BusyScope<'_> {
        self.begin();
        BusyScope { tracker: self }
    }
}

/// Guard returned by [`BusyTracker::scope`].
#[must_use = "dropping the scope immediately ends the operation"]
pub struct BusyScope<'a> {
    tracker: &'a BusyTracker,
}

impl Drop for BusyScope<'_> {
    fn drop(&mut self) {
        self.tracker.end();
    }
}
