//! Level-triggered readiness signal gating asset mutation.

use std::time::Duration;

use tokio::sync::watch;

/// Gate state: open means writes are safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Open,
    Closed,
}

/// The gate stayed closed for the whole wait budget.
#[derive(Debug, thiserror::Error)]
#[error("patch gate did not open within the wait budget")]
pub struct GateTimeout;

/// Process-wide patch gate.
///
/// Level-triggered, not mutual exclusion: every waiter proceeds the instant
/// the gate opens, and opening an already-open gate (or closing an
/// already-closed one) is a no-op. Only the load-state tracker writes it;
/// parse tasks wait on it. The gate is a best-effort timing heuristic —
/// the platform's asset loader holds no lock while reading, so this is the
/// closest thing to a safe-write window that exists.
pub struct PatchGate {
    tx: watch::Sender<GateState>,
}

impl PatchGate {
    /// New gate, initially open.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(GateState::Open);
        Self { tx }
    }

    pub fn open(&self) {
        self.tx.send_if_modified(|state| {
            if *state == GateState::Open {
                false
            } else {
                *state = GateState::Open;
                true
            }
        });
    }

    pub fn close(&self) {
        self.tx.send_if_modified(|state| {
            if *state == GateState::Closed {
                false
            } else {
                *state = GateState::Closed;
                true
            }
        });
    }

    pub fn is_open(&self) -> bool {
        *self.tx.borrow() == GateState::Open
    }

    /// Wait until the gate is open; returns immediately if it already is.
    pub async fn wait_open(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in self, so the channel cannot close under us.
        let _ = rx.wait_for(|state| *state == GateState::Open).await;
    }

    /// Wait until the gate is open, bounded by `timeout`.
    pub async fn wait_open_timeout(&self, timeout: Duration) -> Result<(), GateTimeout> {
        tokio::time::timeout(timeout, self.wait_open())
            .await
            .map_err(|_| GateTimeout)
    }
}

impl Default for PatchGate {
    fn default() -> Self {
        Self::new()
    }
}
