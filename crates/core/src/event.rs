// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Domain events consumed by the dashboard.

use crate::usage::TokenUsage;
use std::path::PathBuf;

/// Events flowing from the scheduler and its workers to the dashboard.
///
/// For a given job the ordering contract is `JobQueued`, then one or more
/// `JobStarted` (retries re-start), then exactly one `JobFinished`.
/// `JobLogUpdate` deliveries are best-effort: a full channel drops them and
/// the ring buffer stays authoritative.
#[derive(Debug, Clone)]
pub enum UiEvent {
    JobQueued {
        index: usize,
        code_files: Vec<String>,
        issue_count: usize,
        safe_name: String,
        out_log: PathBuf,
        err_log: PathBuf,
    },
    JobStarted {
        index: usize,
    },
    JobFinished {
        index: usize,
        ok: bool,
        exit: i32,
    },
    JobLogUpdate {
        index: usize,
        out: Vec<String>,
        err: Vec<String>,
    },
    TokenUsageUpdate {
        index: usize,
        usage: TokenUsage,
    },
}
