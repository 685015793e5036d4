// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Last-activity tracking for the per-job watchdog.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Records the instant of the most recent output byte from a child process.
///
/// The watchdog polls `elapsed()` against the configured activity timeout;
/// every sink in the output chain calls `record()` on non-empty writes.
#[derive(Debug)]
pub struct ActivityMonitor {
    last: Mutex<Instant>,
}

impl ActivityMonitor {
    pub fn new() -> Self {
        Self {
            last: Mutex::new(Instant::now()),
        }
    }

    /// Mark activity at the current instant.
    pub fn record(&self) {
        *self.last.lock() = Instant::now();
    }

    /// Duration since the last recorded activity.
    pub fn elapsed(&self) -> Duration {
        self.last.lock().elapsed()
    }
}

impl Default for ActivityMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
