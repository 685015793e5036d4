// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run-wide cancellation handle.

use tokio::sync::watch;

/// Cancellation root for a run.
///
/// OS signals and the dashboard's quit key both call `cancel()`; workers and
/// the scheduler observe it. Cancelling twice is a no-op.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx, rx }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once cancellation has been requested.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // Error means the sender is gone, which only happens on teardown.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "shutdown_tests.rs"]
mod tests;
