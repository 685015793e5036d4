// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded FIFO of the most recent log lines.

use parking_lot::Mutex;
use std::collections::VecDeque;

/// Thread-safe ring of the last N non-empty lines.
///
/// Backs the live log view: writers push lines as they are cut from the
/// child's output, the dashboard takes snapshots. When the ring is full the
/// oldest line is dropped.
#[derive(Debug)]
pub struct LineRing {
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    lines: VecDeque<String>,
    capacity: usize,
}

impl LineRing {
    /// Create a ring holding at most `capacity` lines (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(Inner {
                lines: VecDeque::with_capacity(capacity),
                capacity,
            }),
        }
    }

    /// Append a line. Empty strings are ignored.
    pub fn push(&self, line: &str) {
        if line.is_empty() {
            return;
        }
        let mut inner = self.inner.lock();
        if inner.lines.len() == inner.capacity {
            inner.lines.pop_front();
        }
        inner.lines.push_back(line.to_string());
    }

    /// Copy the current contents, oldest first.
    pub fn snapshot(&self) -> Vec<String> {
        self.inner.lock().lines.iter().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().lines.is_empty()
    }
}

#[cfg(test)]
#[path = "ring_tests.rs"]
mod tests;
