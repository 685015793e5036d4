//! Execution specs against stub backends installed on a private PATH.

#![cfg(unix)]

use crate::prelude::*;
use std::fs;

fn path_with(stub_bin: &std::path::Path) -> String {
    let system = std::env::var("PATH").unwrap_or_default();
    format!("{}:{system}", stub_bin.display())
}

#[test]
fn successful_jobs_exit_zero_and_append_logs() {
    let project = Project::empty();
    let dir = project.review_dir("21");
    project.file(&format!("{dir}/a.md"), "**File:** `src/a.rs`\nTodo");
    let stub = project.stub_backend("codex", "cat > /dev/null\necho all done\nexit 0");

    let (code, stdout, _) = run(project
        .herd()
        .env("PATH", path_with(&stub))
        .args(["--pr", "21", "--ide", "codex"]));
    assert_eq!(code, 0);
    assert!(stdout.contains("Total: 1  Success: 1  Failed: 0"), "{stdout}");

    let out_log = fs::read_dir(project.prompt_root("21"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .find(|p| p.to_string_lossy().ends_with(".out.log"))
        .unwrap();
    let log = fs::read_to_string(out_log).unwrap();
    assert!(log.contains("all done"));
}

#[test]
fn failing_jobs_surface_exit_codes_and_log_paths() {
    let project = Project::empty();
    let dir = project.review_dir("22");
    project.file(&format!("{dir}/a.md"), "**File:** `src/a.rs`\nTodo");
    let stub = project.stub_backend("codex", "echo kaboom >&2\nexit 7");

    let (code, stdout, _) = run(project
        .herd()
        .env("PATH", path_with(&stub))
        .args(["--pr", "22", "--ide", "codex"]));
    assert_eq!(code, 1);
    assert!(stdout.contains("Total: 1  Success: 0  Failed: 1"), "{stdout}");
    assert!(stdout.contains("src/a.rs (exit 7)"), "{stdout}");
    assert!(stdout.contains(".out.log"), "{stdout}");
    assert!(stdout.contains(".err.log"), "{stdout}");

    let err_log = fs::read_dir(project.prompt_root("22"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .find(|p| p.to_string_lossy().ends_with(".err.log"))
        .unwrap();
    assert!(fs::read_to_string(err_log).unwrap().contains("kaboom"));
}

#[test]
fn missing_backend_fails_preflight_before_any_job() {
    let project = Project::empty();
    let dir = project.review_dir("23");
    project.file(&format!("{dir}/a.md"), "**File:** `src/a.rs`\nTodo");

    // Empty PATH: the probe cannot find the executable.
    let (code, _, stderr) = run(project
        .herd()
        .env("PATH", "/nonexistent-path-entry")
        .args(["--pr", "23", "--ide", "codex"]));
    assert_eq!(code, 1);
    assert!(stderr.contains("preflight"), "{stderr}");
}

#[test]
fn structured_stream_usage_is_aggregated_and_printed() {
    let project = Project::empty();
    let dir = project.review_dir("24");
    project.file(&format!("{dir}/a.md"), "**File:** `src/a.rs`\nTodo");
    let stub = project.stub_backend(
        "claude",
        r#"cat > /dev/null
echo '{"type":"assistant","message":{"content":[{"type":"text","text":"step one"}],"usage":{"input_tokens":10,"output_tokens":20}}}'
echo '{"type":"assistant","message":{"content":[{"type":"text","text":"step two"}],"usage":{"input_tokens":5,"output_tokens":30}}}'
exit 0"#,
    );

    let (code, stdout, _) = run(project
        .herd()
        .env("PATH", path_with(&stub))
        .args(["--pr", "24", "--ide", "claude"]));
    assert_eq!(code, 0);

    // The formatted stream reaches stdout in no-UI mode.
    assert!(stdout.contains("step one"), "{stdout}");
    assert!(stdout.contains("step two"), "{stdout}");

    // Aggregate block: 10+5 in, 20+30 out, total 65.
    assert!(stdout.contains("Token usage"), "{stdout}");
    assert!(stdout.contains("Input tokens:"), "{stdout}");
    assert!(stdout.contains("15"), "{stdout}");
    assert!(stdout.contains("50"), "{stdout}");
    assert!(stdout.contains("65"), "{stdout}");
}

#[test]
fn prompt_bytes_reach_the_backend_stdin() {
    let project = Project::empty();
    let dir = project.review_dir("25");
    project.file(
        &format!("{dir}/a.md"),
        "**File:** `src/a.rs`\nA very recognizable issue body.",
    );
    let stub = project.stub_backend("codex", "cat > received.txt\nexit 0");

    let (code, _, _) = run(project
        .herd()
        .env("PATH", path_with(&stub))
        .args(["--pr", "25", "--ide", "codex"]));
    assert_eq!(code, 0);

    let received = fs::read_to_string(project.path().join("received.txt")).unwrap();
    assert!(received.contains("A very recognizable issue body."));
    assert!(received.contains("PR 25"));
}

#[test]
fn usage_block_is_absent_for_plain_backends() {
    let project = Project::empty();
    let dir = project.review_dir("26");
    project.file(&format!("{dir}/a.md"), "**File:** `src/a.rs`\nTodo");
    let stub = project.stub_backend("droid", "cat > /dev/null\nexit 0");

    let (code, stdout, _) = run(project
        .herd()
        .env("PATH", path_with(&stub))
        .args(["--pr", "26", "--ide", "droid"]));
    assert_eq!(code, 0);
    assert!(!stdout.contains("Token usage"), "{stdout}");
}
