// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Graceful child termination.

use std::time::Duration;
use tokio::process::Child;

/// How long a child gets between SIGTERM and SIGKILL.
pub(crate) const KILL_GRACE: Duration = Duration::from_secs(5);

/// Ask the child to stop, escalating to a forced kill after `grace`.
pub(crate) async fn terminate_gracefully(child: &mut Child, grace: Duration) {
    send_term(child);
    if tokio::time::timeout(grace, child.wait()).await.is_err() {
        let _ = child.start_kill();
        let _ = child.wait().await;
    }
}

#[cfg(unix)]
#[allow(unsafe_code)]
fn send_term(child: &mut Child) {
    if let Some(pid) = child.id() {
        // SAFETY: kill(2) with a live pid and a valid signal number touches
        // no process memory.
        unsafe {
            libc::kill(pid as libc::pid_t, libc::SIGTERM);
        }
    }
}

#[cfg(not(unix))]
fn send_term(child: &mut Child) {
    let _ = child.start_kill();
}
