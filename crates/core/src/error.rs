// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for the driver.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while preparing or executing a run.
///
/// `Config`, `Preflight`, `NotFound` and setup-time `Io` are fatal to the
/// run; `ChildExit` and `Timeout` are per-job and end up in the failure
/// list; `Cancelled` is an orderly stop and is never recorded as a failure.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("backend preflight failed: {0}")]
    Preflight(String),
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("child exited with status {0}")]
    ChildExit(i32),
    #[error("no output for {0:?}: activity timeout exceeded")]
    Timeout(Duration),
    #[error("cancelled")]
    Cancelled,
    #[error("shutdown timeout exceeded")]
    ShutdownTimeout,
}

impl CoreError {
    /// Wrap an I/O error with the path or operation it came from.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        CoreError::Io {
            context: context.into(),
            source,
        }
    }
}
