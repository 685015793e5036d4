// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event channel from workers to the dashboard.

use herd_core::UiEvent;
use tokio::sync::mpsc;

/// Buffer size of the dashboard event channel.
pub const UI_CHANNEL_CAPACITY: usize = 256;

/// Multi-producer handle on the dashboard channel.
///
/// Lifecycle events (`JobQueued`/`JobStarted`/`JobFinished`) are sent
/// reliably; log and usage updates go through `try_send` and may be dropped
/// under back-pressure, where the ring buffers remain authoritative. With no
/// dashboard attached every send is a no-op.
#[derive(Debug, Clone)]
pub struct UiSender {
    tx: Option<mpsc::Sender<UiEvent>>,
}

impl UiSender {
    pub fn new(tx: mpsc::Sender<UiEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A sender with no dashboard behind it.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Reliable delivery for lifecycle events. A closed channel (dashboard
    /// already gone) is not an error.
    pub async fn send(&self, event: UiEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event).await;
        }
    }

    /// Best-effort delivery for high-frequency updates.
    pub fn try_send(&self, event: UiEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.try_send(event);
        }
    }
}
