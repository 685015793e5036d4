// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolved run configuration.
//!
//! The flag/form layer lives in the binary; the engine only ever sees this
//! fully-resolved record.

use crate::error::CoreError;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Default activity timeout (10 minutes).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Default watchdog poll interval.
pub const DEFAULT_WATCHDOG_TICK: Duration = Duration::from_secs(5);

/// What kind of Markdown inputs a run consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Review issues extracted from a PR review (`ai-docs/reviews-pr-<pr>/issues`).
    PrReview,
    /// PRD task files (`tasks/prd-<id>`, one `_task_<N>.md` per task).
    PrdTasks,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::PrReview => write!(f, "pr-review"),
            Mode::PrdTasks => write!(f, "prd-tasks"),
        }
    }
}

/// The external coding CLI driven by a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Emits a newline-delimited JSON stream on stdout; the only backend
    /// with token-usage accounting.
    Claude,
    Codex,
    Droid,
}

impl Backend {
    /// Executable name probed on PATH.
    pub fn executable(&self) -> &'static str {
        match self {
            Backend::Claude => "claude",
            Backend::Codex => "codex",
            Backend::Droid => "droid",
        }
    }

    /// Whether stdout carries the structured JSON stream.
    pub fn has_structured_stream(&self) -> bool {
        matches!(self, Backend::Claude)
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.executable())
    }
}

/// Reasoning-effort level forwarded to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasoningEffort {
    Low,
    Medium,
    High,
}

impl fmt::Display for ReasoningEffort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReasoningEffort::Low => write!(f, "low"),
            ReasoningEffort::Medium => write!(f, "medium"),
            ReasoningEffort::High => write!(f, "high"),
        }
    }
}

/// Fully-resolved configuration handed to the scheduler.
#[derive(Debug, Clone)]
pub struct Settings {
    /// PR number or PRD identifier; names the prompt root.
    pub pr: String,
    pub issues_dir: PathBuf,
    pub mode: Mode,
    pub dry_run: bool,
    pub concurrency: usize,
    pub batch_size: usize,
    pub backend: Backend,
    /// Model override; `None` uses the backend's default.
    pub model: Option<String>,
    /// Write per-group summary files under `<issues_dir>/grouped/`.
    pub grouped: bool,
    /// Capacity of the per-stream line rings.
    pub tail_lines: usize,
    pub effort: ReasoningEffort,
    /// Tasks mode only: keep tasks whose status marks them complete.
    pub include_completed: bool,
    /// Activity timeout per attempt.
    pub timeout: Duration,
    pub max_retries: u32,
    /// Timeout multiplier applied on each retry attempt.
    pub backoff_multiplier: f64,
    /// Watchdog poll interval. Not a user flag; tests shrink it.
    pub watchdog_tick: Duration,
    /// Explicit path to the backend executable, bypassing PATH lookup.
    /// Not a user flag; tests point it at stubs.
    pub backend_program: Option<PathBuf>,
}

impl Settings {
    /// Defaults for everything past the three required fields.
    pub fn new(pr: impl Into<String>, issues_dir: impl Into<PathBuf>, mode: Mode) -> Self {
        Self {
            pr: pr.into(),
            issues_dir: issues_dir.into(),
            mode,
            dry_run: false,
            concurrency: 1,
            batch_size: 1,
            backend: Backend::Claude,
            model: None,
            grouped: false,
            tail_lines: 30,
            effort: ReasoningEffort::Medium,
            include_completed: false,
            timeout: DEFAULT_TIMEOUT,
            max_retries: 3,
            backoff_multiplier: 2.0,
            watchdog_tick: DEFAULT_WATCHDOG_TICK,
            backend_program: None,
        }
    }

    /// Check field constraints and apply mode coercions.
    ///
    /// Batch size is forced to 1 in tasks mode; `grouped` and
    /// `include_completed` are ignored outside their modes but not errors.
    pub fn validated(mut self) -> Result<Self, CoreError> {
        if self.pr.trim().is_empty() {
            return Err(CoreError::Config("pr identifier must not be empty".into()));
        }
        if self.concurrency < 1 {
            return Err(CoreError::Config("concurrent must be >= 1".into()));
        }
        if self.batch_size < 1 {
            return Err(CoreError::Config("batch-size must be >= 1".into()));
        }
        if self.tail_lines < 1 {
            return Err(CoreError::Config("tail-lines must be >= 1".into()));
        }
        if self.backoff_multiplier.is_nan() || self.backoff_multiplier < 1.0 {
            return Err(CoreError::Config(
                "retry-backoff-multiplier must be >= 1.0".into(),
            ));
        }
        if self.mode == Mode::PrdTasks && self.batch_size != 1 {
            self.batch_size = 1;
        }
        Ok(self)
    }
}

/// Parse a duration string like `"30s"`, `"5m"`, `"1h"`.
///
/// A bare number is seconds.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let (num_str, suffix) = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| (&s[..i], &s[i..]))
        .unwrap_or((s, ""));

    let num: u64 = num_str
        .parse()
        .map_err(|_| format!("invalid number in duration: {}", s))?;

    let multiplier = match suffix.trim() {
        "ms" | "millis" | "millisecond" | "milliseconds" => {
            return Ok(Duration::from_millis(num));
        }
        "" | "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3600,
        "d" | "day" | "days" => 86400,
        other => return Err(format!("unknown duration suffix: {}", other)),
    };

    Ok(Duration::from_secs(num * multiplier))
}

/// Parse a timeout flag, falling back to the 10-minute default on any
/// invalid input.
pub fn parse_timeout_or_default(s: &str) -> Duration {
    parse_duration(s).unwrap_or(DEFAULT_TIMEOUT)
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
