//! Container lifecycle state machine and graceful shutdown coordination.
//!
//! States move forward only: `Init -> Discovering -> Loading -> Serving ->
//! Draining -> Stopped`. Once `Draining` or `Stopped` is reached the
//! container never accepts new connections again.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, RwLock};

/// Container lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ContainerState {
    Init,
    Discovering,
    Loading,
    Serving,
    Draining,
    Stopped,
}

impl ContainerState {
    /// Whether `next` is a legal forward transition from `self`.
    pub fn can_advance_to(self, next: ContainerState) -> bool {
        next as u8 == self as u8 + 1
    }
}

/// Result of a shutdown operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownResult {
    Complete,
    Timeout { remaining: u32 },
}

/// Error returned when an illegal state transition is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal transition from {from:?} to {to:?}")]
pub struct IllegalTransition {
    pub from: ContainerState,
    pub to: ContainerState,
}

/// Coordinates the container lifecycle and graceful shutdown.
pub struct ShutdownCoordinator {
    state: Arc<RwLock<ContainerState>>,
    in_flight: Arc<AtomicU32>,
    notify: Arc<Notify>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(ContainerState::Init)),
            in_flight: Arc::new(AtomicU32::new(0)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Get current lifecycle state.
    pub async fn state(&self) -> ContainerState {
        *self.state.read().await
    }

    /// Advance to the next lifecycle state. Fails if `next` is not the
    /// immediate successor of the current state.
    pub async fn advance(&self, next: ContainerState) -> Result<(), IllegalTransition> {
        let mut state = self.state.write().await;
        if !state.can_advance_to(next) {
            return Err(IllegalTransition { from: *state, to: next });
        }
        *state = next;
        Ok(())
    }

    /// Check if accepting new connections (state == Serving).
    pub fn is_accepting(&self) -> bool {
        self.state
            .try_read()
            .map(|s| *s == ContainerState::Serving)
            .unwrap_or(false)
    }

    /// Track an in-flight request. Returns None if not accepting.
    pub fn track(&self) -> Option<ShutdownGuard> {
        if !self.is_accepting() {
            return None;
        }
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        Some(ShutdownGuard {
            counter: self.in_flight.clone(),
            notify: self.notify.clone(),
        })
    }

    /// Current in-flight request count.
    pub fn in_flight_count(&self) -> u32 {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Initiate shutdown: Serving -> Draining, wait for drain (bounded by
    /// `grace_period`), then Draining -> Stopped regardless of outcome.
    pub async fn initiate(&self, grace_period: Duration) -> ShutdownResult {
        {
            let mut state = self.state.write().await;
            *state = ContainerState::Draining;
        }

        let result = self.wait_for_drain(grace_period).await;

        {
            let mut state = self.state.write().await;
            *state = ContainerState::Stopped;
        }

        result
    }

    async fn wait_for_drain(&self, timeout: Duration) -> ShutdownResult {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let count = self.in_flight_count();
            if count == 0 {
                return ShutdownResult::Complete;
            }

            let remaining_time = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining_time.is_zero() {
                return ShutdownResult::Timeout { remaining: count };
            }

            tokio::select! {
                _ = self.notify.notified() => continue,
                _ = tokio::time::sleep(remaining_time) => {
                    let final_count = self.in_flight_count();
                    if final_count == 0 {
                        return ShutdownResult::Complete;
                    }
                    return ShutdownResult::Timeout { remaining: final_count };
                }
            }
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard for in-flight request tracking.
pub struct ShutdownGuard {
    counter: Arc<AtomicU32>,
    notify: Arc<Notify>,
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
        self.notify.notify_one();
    }
}
