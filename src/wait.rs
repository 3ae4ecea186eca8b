//! Suspended-wait state of a runtime.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Outcome of polling a wait.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitPoll {
    /// No wait in progress
    Idle,
    /// Still waiting for the signal
    Pending,
    /// The deadline passed; the wait is over
    TimedOut,
}

/// A pending wait with an optional timeout.
///
/// Time is the simulation clock in milliseconds and is always passed in, so a
/// wait persisted mid-flight resumes with the same deadline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitState {
    pending: bool,
    started_at_ms: u64,
    timeout_ms: Option<u64>,
}

impl WaitState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start waiting at `now_ms`. Replaces any wait already in progress.
    pub fn begin(&mut self, now_ms: u64, timeout_ms: Option<u64>) {
        self.pending = true;
        self.started_at_ms = now_ms;
        self.timeout_ms = timeout_ms;
    }

    /// Check the wait at `now_ms`. A timeout ends the wait.
    pub fn poll(&mut self, now_ms: u64) -> WaitPoll {
        if !self.pending {
            return WaitPoll::Idle;
        }
        match self.deadline_ms() {
            Some(deadline) if now_ms >= deadline => {
                debug!(started = self.started_at_ms, deadline, now = now_ms, "wait timed out");
                self.pending = false;
                WaitPoll::TimedOut
            }
            _ => WaitPoll::Pending,
        }
    }

    /// The awaited signal arrived. Returns false if nothing was pending.
    pub fn resolve(&mut self) -> bool {
        std::mem::replace(&mut self.pending, false)
    }

    /// Drop the wait without a result. Returns false if nothing was pending.
    pub fn abandon(&mut self) -> bool {
        let was_pending = std::mem::replace(&mut self.pending, false);
        if was_pending {
            debug!(started = self.started_at_ms, "wait abandoned");
        }
        was_pending
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn started_at_ms(&self) -> u64 {
        self.started_at_ms
    }

    pub fn timeout_ms(&self) -> Option<u64> {
        self.timeout_ms
    }

    /// Simulation time at which a pending wait times out.
    pub fn deadline_ms(&self) -> Option<u64> {
        if !self.pending {
            return None;
        }
        self.timeout_ms.map(|t| self.started_at_ms.saturating_add(t))
    }
}
