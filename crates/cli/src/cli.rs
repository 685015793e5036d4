// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flag layer: clap args resolved into the engine's `Settings`.

use clap::{Parser, ValueEnum};
use herd_core::settings::parse_timeout_or_default;
use herd_core::{Backend, CoreError, Mode, ReasoningEffort, Settings};
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;

#[allow(clippy::unwrap_used)] // compile-time constant pattern
fn pattern(re: &str) -> Regex {
    Regex::new(re).unwrap()
}

static REVIEW_DIR_PR: LazyLock<Regex> = LazyLock::new(|| pattern(r"reviews-pr-(\d+)"));

#[derive(Debug, Parser)]
#[command(
    name = "herd",
    version,
    about = "Batch-drive coding agents over Markdown issue and task files"
)]
pub struct Cli {
    /// PR number (pr-review) or PRD identifier (prd-tasks)
    #[arg(long)]
    pub pr: Option<String>,

    /// Directory of issue/task Markdown files
    #[arg(long = "issues-dir", value_name = "DIR")]
    pub issues_dir: Option<PathBuf>,

    /// Input mode
    #[arg(long, value_enum, default_value_t = ModeArg::PrReview)]
    pub mode: ModeArg,

    /// Plan and report without spawning the backend
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Jobs running in parallel
    #[arg(long, default_value_t = 1)]
    pub concurrent: usize,

    /// Issues per job (always 1 in prd-tasks mode)
    #[arg(long = "batch-size", default_value_t = 1)]
    pub batch_size: usize,

    /// Backend CLI to drive
    #[arg(long, value_enum, default_value_t = BackendArg::Claude)]
    pub ide: BackendArg,

    /// Model override for the backend
    #[arg(long)]
    pub model: Option<String>,

    /// Write per-file grouped summaries (pr-review mode)
    #[arg(long)]
    pub grouped: bool,

    /// Lines kept in the live log view
    #[arg(long = "tail-lines", default_value_t = 30)]
    pub tail_lines: usize,

    /// Reasoning effort forwarded to the backend
    #[arg(long = "reasoning-effort", value_enum, default_value_t = EffortArg::Medium)]
    pub reasoning_effort: EffortArg,

    /// prd-tasks mode: include tasks already marked complete
    #[arg(long = "include-completed")]
    pub include_completed: bool,

    /// Activity timeout per attempt, e.g. "30s", "10m"
    #[arg(long, default_value = "10m")]
    pub timeout: String,

    /// Retries after an activity timeout
    #[arg(long = "max-retries", default_value_t = 3)]
    pub max_retries: u32,

    /// Timeout multiplier applied per retry
    #[arg(long = "retry-backoff-multiplier", default_value_t = 2.0)]
    pub retry_backoff_multiplier: f64,

    /// Disable the dashboard and stream backend output to this terminal
    #[arg(long = "no-ui")]
    pub no_ui: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    PrReview,
    PrdTasks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Claude,
    Codex,
    Droid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EffortArg {
    Low,
    Medium,
    High,
}

impl From<ModeArg> for Mode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::PrReview => Mode::PrReview,
            ModeArg::PrdTasks => Mode::PrdTasks,
        }
    }
}

impl From<BackendArg> for Backend {
    fn from(value: BackendArg) -> Self {
        match value {
            BackendArg::Claude => Backend::Claude,
            BackendArg::Codex => Backend::Codex,
            BackendArg::Droid => Backend::Droid,
        }
    }
}

impl From<EffortArg> for ReasoningEffort {
    fn from(value: EffortArg) -> Self {
        match value {
            EffortArg::Low => ReasoningEffort::Low,
            EffortArg::Medium => ReasoningEffort::Medium,
            EffortArg::High => ReasoningEffort::High,
        }
    }
}

/// Resolve the parsed flags into validated engine settings.
pub fn resolve(cli: Cli) -> Result<Settings, CoreError> {
    let mode = Mode::from(cli.mode);
    let (pr, issues_dir) = resolve_inputs(cli.pr, cli.issues_dir, mode)?;

    let mut settings = Settings::new(pr, issues_dir, mode);
    settings.dry_run = cli.dry_run;
    settings.concurrency = cli.concurrent;
    settings.batch_size = cli.batch_size;
    settings.backend = Backend::from(cli.ide);
    settings.model = cli.model;
    settings.grouped = cli.grouped;
    settings.tail_lines = cli.tail_lines;
    settings.effort = ReasoningEffort::from(cli.reasoning_effort);
    settings.include_completed = cli.include_completed;
    settings.timeout = parse_timeout_or_default(&cli.timeout);
    settings.max_retries = cli.max_retries;
    settings.backoff_multiplier = cli.retry_backoff_multiplier;
    settings.validated()
}

/// PR ↔ issues-dir resolution.
///
/// Review mode defaults the directory from the PR number and can recover the
/// PR number from a `reviews-pr-<N>` directory; tasks mode defaults the
/// directory from the PRD identifier.
fn resolve_inputs(
    pr: Option<String>,
    issues_dir: Option<PathBuf>,
    mode: Mode,
) -> Result<(String, PathBuf), CoreError> {
    match mode {
        Mode::PrReview => match (pr, issues_dir) {
            (Some(pr), Some(dir)) => Ok((pr, dir)),
            (Some(pr), None) => {
                let dir = PathBuf::from(format!("ai-docs/reviews-pr-{pr}/issues"));
                Ok((pr, dir))
            }
            (None, Some(dir)) => {
                let text = dir.display().to_string();
                let pr = REVIEW_DIR_PR
                    .captures(&text)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().to_string())
                    .ok_or_else(|| {
                        CoreError::Config(format!(
                            "cannot infer a PR number from {text}; pass --pr"
                        ))
                    })?;
                Ok((pr, dir))
            }
            (None, None) => Err(CoreError::Config(
                "--pr or --issues-dir is required".into(),
            )),
        },
        Mode::PrdTasks => match (pr, issues_dir) {
            (Some(pr), Some(dir)) => Ok((pr, dir)),
            (Some(pr), None) => {
                let dir = PathBuf::from(format!("tasks/prd-{pr}"));
                Ok((pr, dir))
            }
            (None, _) => Err(CoreError::Config(
                "--pr is required in prd-tasks mode".into(),
            )),
        },
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
