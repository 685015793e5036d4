// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime display formatting for the dashboard.

use std::time::Duration;

/// Placeholder shown before a job has a measurable runtime.
pub const UNKNOWN_RUNTIME: &str = "--:--";

/// Format a runtime as `MM:SS`, or `HH:MM:SS` once it reaches an hour.
///
/// `None` renders the unknown placeholder. Negative durations cannot be
/// represented by `Duration`; callers clamp via `saturating_duration_since`.
pub fn format_runtime(elapsed: Option<Duration>) -> String {
    let Some(elapsed) = elapsed else {
        return UNKNOWN_RUNTIME.to_string();
    };
    let secs = elapsed.as_secs();
    if secs >= 3600 {
        format!(
            "{:02}:{:02}:{:02}",
            secs / 3600,
            (secs % 3600) / 60,
            secs % 60
        )
    } else {
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
