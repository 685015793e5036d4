// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The unit of scheduling: one batch of issues and its runtime state.

use crate::issue::Issue;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Exit sentinel: job succeeded.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit sentinel: run was cancelled (signal-initiated shutdown).
pub const EXIT_CANCELLED: i32 = -1;
/// Exit sentinel: activity timeout exceeded.
pub const EXIT_TIMEOUT: i32 = -2;
/// Synthetic status recorded when a worker task panics.
pub const EXIT_PANIC: i32 = 101;

/// One batch of issues to resolve in a single backend invocation.
///
/// Immutable after planning. The three artifact paths share the safe-name
/// stem and live under the prompt root.
#[derive(Debug, Clone)]
pub struct Job {
    /// Sorted distinct grouping keys covered by this batch.
    pub code_files: Vec<String>,
    /// Issues of the batch, bucketed by grouping key.
    pub groups: BTreeMap<String, Vec<Issue>>,
    /// Filesystem-safe identifier shared by the artifact paths.
    pub safe_name: String,
    /// Prompt bytes fed to the child process via stdin.
    pub prompt: Vec<u8>,
    pub prompt_path: PathBuf,
    pub out_log: PathBuf,
    pub err_log: PathBuf,
}

impl Job {
    pub fn issue_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Display name for summaries: the grouping keys, comma-joined.
    pub fn display_code_file(&self) -> String {
        self.code_files.join(", ")
    }
}

/// Runtime state of a job. Transitions are driven exclusively by the
/// supervisor's events; retries re-enter `Running` without surfacing the
/// intermediate timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Running,
    Success,
    /// Terminal failure with its exit sentinel (see `EXIT_*`).
    Failed(i32),
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failed(_))
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Success => write!(f, "success"),
            JobStatus::Failed(_) => write!(f, "failed"),
        }
    }
}

/// Record of a failed job, kept for the final summary.
///
/// Appended under a mutex; the list's order is unspecified.
#[derive(Debug, Clone)]
pub struct Failure {
    pub code_file: String,
    pub exit_code: i32,
    pub out_log: PathBuf,
    pub err_log: PathBuf,
    pub error: String,
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
