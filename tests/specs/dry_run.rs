//! Planning specs driven through `--dry-run`: discovery, filtering,
//! ordering and artifact layout, with no backend spawned.

use crate::prelude::*;
use std::fs;

#[test]
fn empty_directory_is_a_clean_no_op() {
    let project = Project::empty();
    let dir = project.review_dir("1");
    fs::create_dir_all(project.path().join(&dir)).unwrap();

    let (code, stdout, _) = run(project.herd().args(["--pr", "1", "--dry-run"]));
    assert_eq!(code, 0);
    assert!(stdout.contains("nothing to do"), "{stdout}");
}

#[test]
fn tasks_run_in_numeric_order_one_issue_per_job() {
    let project = Project::empty();
    for n in [1, 2, 10, 11] {
        project.file(&format!("tasks/prd-auth/_task_{n}.md"), "body");
    }

    let (code, stdout, _) = run(project.herd().args([
        "--mode",
        "prd-tasks",
        "--pr",
        "auth",
        "--include-completed",
        "--batch-size",
        "4",
        "--dry-run",
    ]));
    assert_eq!(code, 0);
    assert!(stdout.contains("Total: 4  Success: 4  Failed: 0"), "{stdout}");

    // One prompt per task, numeric order intact in the planned names.
    let mut prompts: Vec<String> = fs::read_dir(project.prompt_root("auth"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".prompt.md"))
        .collect();
    prompts.sort();
    assert_eq!(prompts.len(), 4);
    for n in [1, 2, 10, 11] {
        assert!(
            prompts.iter().any(|p| p.starts_with(&format!("_task_{n}-"))),
            "missing prompt for task {n}: {prompts:?}"
        );
    }
}

#[test]
fn resolved_issues_are_excluded_from_planning() {
    let project = Project::empty();
    let dir = project.review_dir("7");
    project.file(&format!("{dir}/a.md"), "Status: RESOLVED\n");
    project.file(&format!("{dir}/b.md"), "**File:** `src/x.go:42`\nTodo");

    let (code, stdout, _) = run(project.herd().args(["--pr", "7", "--dry-run"]));
    assert_eq!(code, 0);
    assert!(stdout.contains("Total: 1  Success: 1  Failed: 0"), "{stdout}");

    let prompts: Vec<String> = fs::read_dir(project.prompt_root("7"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".prompt.md"))
        .collect();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].starts_with("src_x.go-"), "{prompts:?}");
}

#[test]
fn headerless_issues_plan_under_the_unknown_stem() {
    let project = Project::empty();
    let dir = project.review_dir("9");
    project.file(&format!("{dir}/orphan.md"), "no file header");

    let (code, _, _) = run(project.herd().args(["--pr", "9", "--dry-run"]));
    assert_eq!(code, 0);

    let prompts: Vec<String> = fs::read_dir(project.prompt_root("9"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".prompt.md"))
        .collect();
    let pattern = regex::Regex::new(r"^unknown-[0-9a-f]{6}\.prompt\.md$").unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(pattern.is_match(&prompts[0]), "{prompts:?}");
}

#[test]
fn grouped_flag_writes_per_file_summaries() {
    let project = Project::empty();
    let dir = project.review_dir("12");
    project.file(&format!("{dir}/a.md"), "**File:** `src/x.rs`\nfirst");
    project.file(&format!("{dir}/b.md"), "**File:** `src/x.rs:3`\nsecond");

    let (code, _, _) = run(project
        .herd()
        .args(["--pr", "12", "--grouped", "--dry-run"]));
    assert_eq!(code, 0);

    let grouped = project.path().join(dir).join("grouped");
    let files: Vec<String> = fs::read_dir(&grouped)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files.len(), 1, "{files:?}");
    let body = fs::read_to_string(grouped.join(&files[0])).unwrap();
    assert!(body.contains("first") && body.contains("second"));
}

#[test]
fn prompt_files_carry_the_issue_content() {
    let project = Project::empty();
    let dir = project.review_dir("3");
    project.file(
        &format!("{dir}/a.md"),
        "**File:** `src/lib.rs`\nFix the frobnicator.",
    );

    let (code, _, _) = run(project.herd().args(["--pr", "3", "--dry-run"]));
    assert_eq!(code, 0);

    let root = project.prompt_root("3");
    let prompt = fs::read_dir(&root)
        .unwrap()
        .map(|e| e.unwrap().path())
        .find(|p| p.to_string_lossy().ends_with(".prompt.md"))
        .unwrap();
    let body = fs::read_to_string(prompt).unwrap();
    assert!(body.contains("PR 3"));
    assert!(body.contains("src/lib.rs"));
    assert!(body.contains("Fix the frobnicator."));
}
