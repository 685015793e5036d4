// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Input records: one Markdown issue or task file.

use std::path::PathBuf;

/// Grouping-key prefix for review issues whose source file could not be
/// determined from the Markdown header.
pub const UNKNOWN_FILE_PREFIX: &str = "__unknown__:";

/// One discovered issue or task file.
///
/// Read once at startup; the driver never mutates the file on disk.
#[derive(Debug, Clone)]
pub struct Issue {
    /// File basename (e.g. `issue-003.md`).
    pub name: String,
    /// Absolute path to the file.
    pub abs_path: PathBuf,
    /// Full file contents.
    pub content: String,
    /// Grouping key: the code file extracted from the header, the
    /// `__unknown__:<name>` sentinel, or the filename stem in tasks mode.
    pub code_file: String,
}

/// Metadata extracted from a task file's `<task_context>` block.
///
/// Only `status` drives behaviour; the remaining fields are carried for
/// the grouped summaries.
#[derive(Debug, Clone, Default)]
pub struct TaskMeta {
    pub status: Option<String>,
    pub domain: Option<String>,
    pub task_type: Option<String>,
    pub scope: Option<String>,
    pub complexity: Option<String>,
    pub dependencies: Vec<String>,
}

impl TaskMeta {
    /// Whether the task's status marks it as already done.
    pub fn is_complete(&self) -> bool {
        self.status
            .as_deref()
            .map(|s| {
                matches!(
                    s.trim().to_ascii_lowercase().as_str(),
                    "completed" | "done" | "finished"
                )
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
#[path = "issue_tests.rs"]
mod tests;
