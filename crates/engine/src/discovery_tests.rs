// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use herd_core::Mode;
use tempfile::TempDir;

fn write_file(dir: &TempDir, name: &str, content: &str) {
    fs::write(dir.path().join(name), content).unwrap();
}

#[test]
fn missing_directory_is_not_found() {
    let err = read_entries(Path::new("/nonexistent/issues"), Mode::PrReview, false).unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[test]
fn tasks_sort_numerically() {
    let dir = TempDir::new().unwrap();
    for name in ["_task_10.md", "_task_2.md", "_task_1.md", "_task_11.md"] {
        write_file(&dir, name, "body");
    }

    let entries = read_entries(dir.path(), Mode::PrdTasks, true).unwrap();
    let names: Vec<&str> = entries.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["_task_1.md", "_task_2.md", "_task_10.md", "_task_11.md"]
    );
    assert_eq!(entries[0].code_file, "_task_1");
}

#[test]
fn tasks_ignore_non_task_files() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "_task_1.md", "body");
    write_file(&dir, "_summary.md", "summary");
    write_file(&dir, "notes.md", "notes");
    write_file(&dir, "_task_x.md", "not numbered");

    let entries = read_entries(dir.path(), Mode::PrdTasks, true).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "_task_1.md");
}

#[test]
fn completed_tasks_are_skipped_by_default() {
    let dir = TempDir::new().unwrap();
    write_file(
        &dir,
        "_task_1.md",
        "<task_context>\n<status>completed</status>\n</task_context>\nbody",
    );
    write_file(
        &dir,
        "_task_2.md",
        "<task_context>\n<status>in_progress</status>\n</task_context>\nbody",
    );

    let entries = read_entries(dir.path(), Mode::PrdTasks, false).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "_task_2.md");

    let all = read_entries(dir.path(), Mode::PrdTasks, true).unwrap();
    assert_eq!(all.len(), 2);
}

#[test]
fn review_excludes_summary_and_sorts_lexicographically() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "b.md", "**File:** `src/b.rs`\n");
    write_file(&dir, "a.md", "**File:** `src/a.rs`\n");
    write_file(&dir, "_summary.md", "skip me");
    write_file(&dir, "readme.txt", "not markdown");

    let entries = read_entries(dir.path(), Mode::PrReview, false).unwrap();
    let names: Vec<&str> = entries.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["a.md", "b.md"]);
}

#[yare::parameterized(
    with_line      = { "**File:** `src/x.go:42`\nTodo", "src/x.go" },
    without_line   = { "**File:** `src/lib.rs`\nTodo", "src/lib.rs" },
    spaced         = { "**File:**   `pkg/mod.rs:7`", "pkg/mod.rs" },
    non_numeric    = { "**File:** `c:windows`", "c:windows" },
)]
fn header_extraction(content: &str, expected: &str) {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "issue.md", content);

    let entries = read_entries(dir.path(), Mode::PrReview, false).unwrap();
    assert_eq!(entries[0].code_file, expected);
}

#[test]
fn missing_header_uses_unknown_sentinel() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "orphan.md", "no header here");

    let entries = read_entries(dir.path(), Mode::PrReview, false).unwrap();
    assert_eq!(entries[0].code_file, "__unknown__:orphan.md");
}

#[yare::parameterized(
    marker            = { "Fixed.\nRESOLVED ✓", true },
    marker_lowercase  = { "resolved ✓ yesterday", true },
    status_line       = { "Status: resolved", true },
    state_line        = { "  state:  Resolved by refactor", true },
    state_lower       = { "state: resolved\nrest", true },
    checkbox          = { "- [x] resolved", true },
    checkbox_upper    = { "  - [X] resolved", true },
    unchecked         = { "- [ ] resolved", false },
    plain_todo        = { "**File:** `a.rs`\nTodo", false },
    resolved_in_prose = { "this will be resolved later", false },
)]
fn resolved_detection(content: &str, expected: bool) {
    assert_eq!(is_resolved(content), expected);
}

#[test]
fn filter_unresolved_is_idempotent() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "a.md", "Status: RESOLVED\n");
    write_file(&dir, "b.md", "**File:** `src/x.go:42`\nTodo");

    let entries = read_entries(dir.path(), Mode::PrReview, false).unwrap();
    let once = filter_unresolved(entries);
    assert_eq!(once.len(), 1);
    assert_eq!(once[0].name, "b.md");

    let names: Vec<String> = once.iter().map(|i| i.name.clone()).collect();
    let twice = filter_unresolved(once);
    let names_twice: Vec<String> = twice.iter().map(|i| i.name.clone()).collect();
    assert_eq!(names, names_twice);
}

#[test]
fn grouping_buckets_by_code_file() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "a.md", "**File:** `src/x.rs`\none");
    write_file(&dir, "b.md", "**File:** `src/y.rs`\ntwo");
    write_file(&dir, "c.md", "**File:** `src/x.rs:9`\nthree");

    let entries = read_entries(dir.path(), Mode::PrReview, false).unwrap();
    let groups = group_by_code_file(entries);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups["src/x.rs"].len(), 2);
    assert_eq!(groups["src/y.rs"].len(), 1);
}

#[test]
fn task_meta_parses_context_block() {
    let meta = parse_task_meta(
        "# Task\n<task_context>\n<domain>engine</domain>\n<type>feature</type>\n\
         <scope>core</scope>\n<complexity>medium</complexity>\n\
         <dependencies>task_1, task_2</dependencies>\n<status>pending</status>\n\
         </task_context>\nBody",
    );
    assert_eq!(meta.domain.as_deref(), Some("engine"));
    assert_eq!(meta.task_type.as_deref(), Some("feature"));
    assert_eq!(meta.scope.as_deref(), Some("core"));
    assert_eq!(meta.complexity.as_deref(), Some("medium"));
    assert_eq!(meta.dependencies, vec!["task_1", "task_2"]);
    assert_eq!(meta.status.as_deref(), Some("pending"));
    assert!(!meta.is_complete());
}

#[test]
fn task_meta_falls_back_to_status_line() {
    let meta = parse_task_meta("# Task\n\n**Status:** done\n\nBody");
    assert_eq!(meta.status.as_deref(), Some("done"));
    assert!(meta.is_complete());
}

#[test]
fn task_meta_without_metadata_is_empty() {
    let meta = parse_task_meta("just a body");
    assert!(meta.status.is_none());
    assert!(meta.dependencies.is_empty());
}

#[test]
fn grouped_summaries_write_one_file_per_key() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "a.md", "**File:** `src/x.rs`\nfirst");
    write_file(&dir, "b.md", "**File:** `src/x.rs`\nsecond");
    write_file(&dir, "c.md", "no header");

    let entries = read_entries(dir.path(), Mode::PrReview, false).unwrap();
    let groups = group_by_code_file(entries);
    write_grouped_summaries(dir.path(), &groups).unwrap();

    let grouped: Vec<String> = fs::read_dir(dir.path().join("grouped"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(grouped.len(), 2);

    let summary = grouped
        .iter()
        .find(|n| n.starts_with("src_x.rs-"))
        .unwrap();
    let body = fs::read_to_string(dir.path().join("grouped").join(summary)).unwrap();
    assert!(body.contains("2 issue(s)"));
    assert!(body.contains("first"));
    assert!(body.contains("second"));
}
