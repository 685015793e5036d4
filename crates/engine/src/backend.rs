// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backend invocations: argument vectors, effort prompts, preflight.

use herd_core::{Backend, CoreError, ReasoningEffort, Settings};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;

/// How long the help probe may take before the backend counts as broken.
pub const PREFLIGHT_TIMEOUT: Duration = Duration::from_secs(5);

/// Model used for the structured-stream backend when no override is given.
const DEFAULT_CLAUDE_MODEL: &str = "sonnet";

/// System-prompt guidance appended per reasoning-effort level
/// (structured-stream backend only).
pub fn effort_prompt(effort: ReasoningEffort) -> &'static str {
    match effort {
        ReasoningEffort::Low => "Think concisely and act quickly. Prefer direct solutions.",
        ReasoningEffort::Medium => {
            "Think hard through problems carefully before acting. \
             Balance speed with thoroughness."
        }
        ReasoningEffort::High => {
            "Ultrathink deeply and comprehensively before taking action. \
             Consider edge cases, alternatives, and long-term implications. \
             Show your reasoning process."
        }
    }
}

/// A ready-to-spawn child invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

/// Build the argument vector for the configured backend.
pub fn build_invocation(settings: &Settings) -> Invocation {
    let effort = settings.effort.to_string();
    let args = match settings.backend {
        Backend::Claude => {
            let model = settings
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_CLAUDE_MODEL.to_string());
            vec![
                "--print".to_string(),
                "--output-format".to_string(),
                "stream-json".to_string(),
                "--verbose".to_string(),
                "--model".to_string(),
                model,
                "--permission-mode".to_string(),
                "bypassPermissions".to_string(),
                "--dangerously-skip-permissions".to_string(),
                "--append-system-prompt".to_string(),
                effort_prompt(settings.effort).to_string(),
            ]
        }
        Backend::Codex => {
            let mut args = vec!["--full-auto".to_string()];
            if let Some(model) = &settings.model {
                args.push("-m".to_string());
                args.push(model.clone());
            }
            args.push("-c".to_string());
            args.push(format!("model_reasoning_effort={effort}"));
            args.push("exec".to_string());
            args.push("-".to_string());
            args
        }
        Backend::Droid => {
            let mut args = vec![
                "exec".to_string(),
                "--auto".to_string(),
                "medium".to_string(),
                "--reasoning-effort".to_string(),
                effort,
            ];
            if let Some(model) = &settings.model {
                args.push("--model".to_string());
                args.push(model.clone());
            }
            args.push("--file".to_string());
            args.push("-".to_string());
            args
        }
    };
    Invocation {
        program: backend_program(settings),
        args,
    }
}

/// The executable to spawn: the explicit override when set, otherwise the
/// backend's PATH name.
fn backend_program(settings: &Settings) -> String {
    settings
        .backend_program
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| settings.backend.executable().to_string())
}

/// Run a subprocess command with a timeout.
///
/// Wraps `Command::output()` with `tokio::time::timeout`, converting timeout
/// expiration into a descriptive error message. The child is killed
/// automatically when the timeout elapses (tokio `Child` drop).
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<Output, String> {
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(io_err)) => Err(format!("{} failed: {}", description, io_err)),
        Err(_elapsed) => Err(format!(
            "{} timed out after {}s",
            description,
            timeout.as_secs()
        )),
    }
}

/// Verify the backend executable is on PATH and answers a help probe.
pub async fn preflight(settings: &Settings) -> Result<(), CoreError> {
    let exe = backend_program(settings);
    let mut cmd = Command::new(&exe);
    cmd.arg("--help").stdin(Stdio::null());

    cmd.kill_on_drop(true);

    let output = run_with_timeout(cmd, PREFLIGHT_TIMEOUT, &format!("`{exe} --help`"))
        .await
        .map_err(CoreError::Preflight)?;
    if !output.status.success() {
        return Err(CoreError::Preflight(format!(
            "`{exe} --help` exited with {}",
            output.status
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "backend_tests.rs"]
mod tests;
