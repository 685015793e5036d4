//! Test helpers for the behavioural specifications.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Keep specs snappy; anything slower is a bug, not a tuning problem.
pub const SPEC_TIMEOUT: Duration = Duration::from_secs(60);

/// A scratch project directory the binary runs inside.
pub struct Project {
    root: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            root: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Write a file under the project root, creating parent directories.
    pub fn file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.root.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    /// A review-issues directory for the given PR number.
    pub fn review_dir(&self, pr: &str) -> String {
        format!("ai-docs/reviews-pr-{pr}/issues")
    }

    /// Install a stub backend executable named `name` on a private PATH
    /// prefix; it answers `--help` and then runs `body`.
    #[cfg(unix)]
    pub fn stub_backend(&self, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let bin = self.root.path().join("stub-bin");
        fs::create_dir_all(&bin).unwrap();
        let path = bin.join(name);
        fs::write(
            &path,
            format!("#!/bin/sh\nif [ \"$1\" = \"--help\" ]; then exit 0; fi\n{body}\n"),
        )
        .unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        bin
    }

    /// The herd binary, run inside this project without the dashboard.
    pub fn herd(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::cargo_bin("herd").unwrap();
        cmd.current_dir(self.root.path());
        cmd.timeout(SPEC_TIMEOUT);
        cmd.arg("--no-ui");
        cmd
    }

    /// Prompt root the binary creates for a PR.
    pub fn prompt_root(&self, pr: &str) -> PathBuf {
        self.root
            .path()
            .join(".tmp/codex-prompts")
            .join(format!("pr-{pr}"))
    }
}

/// Run and collect (exit code, stdout, stderr).
pub fn run(cmd: &mut assert_cmd::Command) -> (i32, String, String) {
    let output = cmd.output().unwrap();
    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
    )
}
