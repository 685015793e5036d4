// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::PathBuf;

fn issue(name: &str, code_file: &str) -> Issue {
    Issue {
        name: name.to_string(),
        abs_path: PathBuf::from("/in").join(name),
        content: String::new(),
        code_file: code_file.to_string(),
    }
}

fn job() -> Job {
    let mut groups = BTreeMap::new();
    groups.insert(
        "src/a.rs".to_string(),
        vec![issue("1.md", "src/a.rs"), issue("2.md", "src/a.rs")],
    );
    groups.insert("src/b.rs".to_string(), vec![issue("3.md", "src/b.rs")]);
    Job {
        code_files: vec!["src/a.rs".to_string(), "src/b.rs".to_string()],
        groups,
        safe_name: "batch_001".to_string(),
        prompt: b"do it".to_vec(),
        prompt_path: PathBuf::from("/tmp/batch_001.prompt.md"),
        out_log: PathBuf::from("/tmp/batch_001.out.log"),
        err_log: PathBuf::from("/tmp/batch_001.err.log"),
    }
}

#[test]
fn issue_count_sums_groups() {
    assert_eq!(job().issue_count(), 3);
}

#[test]
fn display_code_file_joins_keys() {
    assert_eq!(job().display_code_file(), "src/a.rs, src/b.rs");
}

#[yare::parameterized(
    pending = { JobStatus::Pending, false },
    running = { JobStatus::Running, false },
    success = { JobStatus::Success, true },
    failed  = { JobStatus::Failed(EXIT_TIMEOUT), true },
)]
fn terminal_states(status: JobStatus, expected: bool) {
    assert_eq!(status.is_terminal(), expected);
}

#[test]
fn status_labels() {
    assert_eq!(JobStatus::Pending.to_string(), "pending");
    assert_eq!(JobStatus::Running.to_string(), "running");
    assert_eq!(JobStatus::Success.to_string(), "success");
    assert_eq!(JobStatus::Failed(2).to_string(), "failed");
}
