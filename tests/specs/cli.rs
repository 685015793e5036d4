//! Flag-layer specs: help, configuration errors, exit codes.

use crate::prelude::*;

#[test]
fn help_lists_the_contract_flags() {
    let project = Project::empty();
    let (code, stdout, _) = run(project.herd().arg("--help"));
    assert_eq!(code, 0);
    for flag in [
        "--pr",
        "--issues-dir",
        "--mode",
        "--dry-run",
        "--concurrent",
        "--batch-size",
        "--ide",
        "--tail-lines",
        "--reasoning-effort",
        "--timeout",
        "--max-retries",
        "--retry-backoff-multiplier",
    ] {
        assert!(stdout.contains(flag), "help is missing {flag}");
    }
}

#[test]
fn missing_inputs_are_a_fatal_config_error() {
    let project = Project::empty();
    let (code, _, stderr) = run(&mut project.herd());
    assert_eq!(code, 1);
    assert!(stderr.contains("invalid configuration"), "{stderr}");
}

#[test]
fn uninferable_directory_is_a_fatal_config_error() {
    let project = Project::empty();
    project.file("some/dir/a.md", "**File:** `x.rs`\n");
    let (code, _, stderr) = run(project.herd().args(["--issues-dir", "some/dir"]));
    assert_eq!(code, 1);
    assert!(stderr.contains("cannot infer"), "{stderr}");
}

#[test]
fn missing_issues_directory_is_fatal() {
    let project = Project::empty();
    let (code, _, stderr) = run(project.herd().args(["--pr", "404", "--dry-run"]));
    assert_eq!(code, 1);
    assert!(stderr.contains("not found"), "{stderr}");
}

#[test]
fn pr_number_is_inferred_from_the_directory_name() {
    let project = Project::empty();
    let dir = project.review_dir("88");
    project.file(&format!("{dir}/a.md"), "**File:** `src/a.rs`\nTodo");

    let (code, stdout, _) = run(project
        .herd()
        .args(["--issues-dir", &dir, "--dry-run"]));
    assert_eq!(code, 0);
    assert!(stdout.contains("Total: 1"), "{stdout}");
    assert!(project.prompt_root("88").is_dir());
}
