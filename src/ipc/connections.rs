//! Active-connection accounting.
//!
//! Unlike the connection pool this descends from, this one never refuses a
//! connection — the container has no back-pressure policy. It exists only
//! so the metrics snapshot can report `active_connections`.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Tracks active connection count for metrics; never gates acceptance.
pub struct ConnectionTracker {
    active: AtomicUsize,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self { active: AtomicUsize::new(0) }
    }

    /// Record a new connection. Always succeeds.
    pub fn acquire(&self) -> ConnectionGuard<'_> {
        self.active.fetch_add(1, Ordering::SeqCst);
        ConnectionGuard { tracker: self }
    }

    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    fn release(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard that decrements the active count on drop.
pub struct ConnectionGuard<'a> {
    tracker: &'a ConnectionTracker,
}

impl Drop for ConnectionGuard<'_> {
    fn drop(&mut self) {
        self.tracker.release();
    }
}
