// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prompt assembly for one batch.
//!
//! The wording here is deliberately plain; the engine treats the result as
//! opaque bytes and nothing downstream parses it back.

use herd_core::{Issue, Mode, UNKNOWN_FILE_PREFIX};
use std::collections::BTreeMap;

/// Render the prompt for one batch of issues.
///
/// Pure function of its inputs; the same batch always yields the same bytes.
pub fn render(
    pr: &str,
    groups: &BTreeMap<String, Vec<Issue>>,
    grouped: bool,
    mode: Mode,
) -> String {
    let mut out = String::new();
    match mode {
        Mode::PrdTasks => {
            out.push_str(&format!("# Task execution — PRD `{pr}`\n\n"));
            out.push_str(
                "Complete each task below in full. Follow the task's own \
                 acceptance criteria, keep changes minimal, and run the \
                 project's checks before finishing.\n",
            );
        }
        Mode::PrReview => {
            out.push_str(&format!("# Review issue resolution — PR {pr}\n\n"));
            out.push_str(
                "Resolve every issue listed below. Make the smallest correct \
                 change for each, then append `RESOLVED ✓` with a one-line \
                 explanation to the corresponding issue section of your \
                 report.\n",
            );
            if grouped {
                out.push_str(
                    "Issues are grouped by source file; resolve each file's \
                     group together.\n",
                );
            }
        }
    }

    for (code_file, issues) in groups {
        if let Some(name) = code_file.strip_prefix(UNKNOWN_FILE_PREFIX) {
            out.push_str(&format!("\n## {name} (no source file identified)\n"));
        } else {
            out.push_str(&format!("\n## `{code_file}`\n"));
        }
        for issue in issues {
            out.push_str(&format!("\n### {}\n\n", issue.name));
            out.push_str(issue.content.trim_end());
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
#[path = "prompt_tests.rs"]
mod tests;
