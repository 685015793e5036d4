// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job supervision: spawn the backend, stream its output, enforce the
//! activity timeout, retry timed-out attempts.

use crate::backend;
use crate::json_stream::{JsonFormatter, UsageCallback};
use crate::shutdown::Shutdown;
use crate::signal::{self, KILL_GRACE};
use crate::tap::{ActivityWriter, LogTap, StreamKind, StreamSink};
use crate::ui::UiSender;
use herd_core::{
    ActivityMonitor, CoreError, Failure, Job, LineRing, Settings, TokenUsage, UiEvent,
    EXIT_CANCELLED, EXIT_SUCCESS, EXIT_TIMEOUT,
};
use parking_lot::Mutex;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::sync::oneshot;
use tokio::task::JoinSet;

/// Time allowed for the output pumps to drain after the child is gone.
const PUMP_DRAIN: Duration = Duration::from_secs(2);

/// Shared state a worker needs to run jobs.
pub struct RunContext {
    pub settings: Arc<Settings>,
    pub ui: UiSender,
    pub shutdown: Shutdown,
    pub failures: Arc<Mutex<Vec<Failure>>>,
    pub aggregate: Arc<Mutex<TokenUsage>>,
}

/// Result of a single attempt.
enum Attempt {
    Success,
    /// Child exited non-zero (its status) or could not be waited on (-1).
    Failed(i32),
    /// No output within the activity timeout; eligible for retry.
    TimedOut,
    Cancelled,
    /// Spawn or log-file setup failed.
    Error(String),
}

/// Run one job to completion, including retries.
///
/// Emits `JobStarted` once per attempt and exactly one final `JobFinished`;
/// only the final outcome is externally visible. Returns whether the job
/// succeeded. Cancellation is not recorded as a failure.
pub async fn run_job(index: usize, job: Arc<Job>, ctx: Arc<RunContext>) -> bool {
    if ctx.shutdown.is_cancelled() {
        ctx.ui
            .send(UiEvent::JobFinished {
                index,
                ok: false,
                exit: EXIT_CANCELLED,
            })
            .await;
        return false;
    }

    if ctx.settings.dry_run {
        ctx.ui.send(UiEvent::JobStarted { index }).await;
        ctx.ui
            .send(UiEvent::JobFinished {
                index,
                ok: true,
                exit: EXIT_SUCCESS,
            })
            .await;
        return true;
    }

    // Rings persist across retries so the live view keeps its history.
    let out_ring = Arc::new(LineRing::new(ctx.settings.tail_lines));
    let err_ring = Arc::new(LineRing::new(ctx.settings.tail_lines));

    let attempts = ctx.settings.max_retries + 1;
    let mut timeout = ctx.settings.timeout;
    let mut outcome = Attempt::Cancelled;

    for attempt in 1..=attempts {
        if attempt > 1 {
            timeout = timeout.mul_f64(ctx.settings.backoff_multiplier);
            tracing::info!(
                job = %job.safe_name,
                attempt,
                timeout_secs = timeout.as_secs(),
                "retrying after activity timeout"
            );
        }
        ctx.ui.send(UiEvent::JobStarted { index }).await;

        outcome = run_attempt(index, &job, &ctx, &out_ring, &err_ring, timeout).await;
        match outcome {
            Attempt::TimedOut if attempt < attempts => continue,
            _ => break,
        }
    }

    finish(index, &job, &ctx, outcome, timeout).await
}

/// Record the final outcome and emit the terminal event.
async fn finish(
    index: usize,
    job: &Job,
    ctx: &RunContext,
    outcome: Attempt,
    final_timeout: Duration,
) -> bool {
    let (ok, exit) = match outcome {
        Attempt::Success => (true, EXIT_SUCCESS),
        Attempt::Failed(code) => {
            record_failure(ctx, job, code, CoreError::ChildExit(code).to_string());
            (false, code)
        }
        Attempt::TimedOut => {
            record_failure(
                ctx,
                job,
                EXIT_TIMEOUT,
                CoreError::Timeout(final_timeout).to_string(),
            );
            (false, EXIT_TIMEOUT)
        }
        Attempt::Cancelled => (false, EXIT_CANCELLED),
        Attempt::Error(message) => {
            record_failure(ctx, job, EXIT_CANCELLED, message);
            (false, EXIT_CANCELLED)
        }
    };
    ctx.ui
        .send(UiEvent::JobFinished { index, ok, exit })
        .await;
    ok
}

fn record_failure(ctx: &RunContext, job: &Job, exit_code: i32, error: String) {
    tracing::warn!(job = %job.safe_name, exit_code, error = %error, "job failed");
    ctx.failures.lock().push(Failure {
        code_file: job.display_code_file(),
        exit_code,
        out_log: job.out_log.clone(),
        err_log: job.err_log.clone(),
        error,
    });
}

/// One spawn of the backend with its watchdog.
async fn run_attempt(
    index: usize,
    job: &Job,
    ctx: &RunContext,
    out_ring: &Arc<LineRing>,
    err_ring: &Arc<LineRing>,
    timeout: Duration,
) -> Attempt {
    let monitor = Arc::new(ActivityMonitor::new());

    let out_file = match open_log(&job.out_log) {
        Ok(f) => f,
        Err(e) => return Attempt::Error(e.to_string()),
    };
    let err_file = match open_log(&job.err_log) {
        Ok(f) => f,
        Err(e) => return Attempt::Error(e.to_string()),
    };

    let invocation = backend::build_invocation(&ctx.settings);
    tracing::debug!(
        job = %job.safe_name,
        program = %invocation.program,
        "spawning backend"
    );

    let mut cmd = Command::new(&invocation.program);
    cmd.args(&invocation.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .env("FORCE_COLOR", "1")
        .env("CLICOLOR_FORCE", "1")
        .env("TERM", "xterm-256color")
        .kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            return Attempt::Error(format!("failed to spawn {}: {e}", invocation.program))
        }
    };

    // Feed the prompt and close stdin so the backend sees EOF.
    let stdin = child.stdin.take();
    let prompt = job.prompt.clone();
    let stdin_task = tokio::spawn(async move {
        if let Some(mut stdin) = stdin {
            let _ = stdin.write_all(&prompt).await;
        }
    });

    let (out_sink, err_sink) = build_sinks(index, ctx, &monitor, out_ring, err_ring);

    let mut pumps = JoinSet::new();
    if let Some(stdout) = child.stdout.take() {
        pumps.spawn(pump(stdout, out_file, out_sink));
    }
    if let Some(stderr) = child.stderr.take() {
        pumps.spawn(pump(stderr, err_file, err_sink));
    }

    // Watchdog: poll the monitor on a fixed tick, fire once on starvation.
    let (watchdog_tx, watchdog_rx) = oneshot::channel::<()>();
    let watchdog_monitor = Arc::clone(&monitor);
    let tick = ctx.settings.watchdog_tick;
    let watchdog = tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick);
        interval.tick().await;
        loop {
            interval.tick().await;
            if watchdog_monitor.elapsed() > timeout {
                let _ = watchdog_tx.send(());
                break;
            }
        }
    });

    enum Waited {
        Exited(std::io::Result<std::process::ExitStatus>),
        Starved,
        Cancelled,
    }

    let waited = tokio::select! {
        status = child.wait() => Waited::Exited(status),
        _ = watchdog_rx => Waited::Starved,
        () = ctx.shutdown.cancelled() => Waited::Cancelled,
    };

    let outcome = match waited {
        Waited::Exited(Ok(status)) if status.success() => Attempt::Success,
        Waited::Exited(Ok(status)) => Attempt::Failed(status.code().unwrap_or(EXIT_CANCELLED)),
        Waited::Exited(Err(e)) => Attempt::Error(format!("wait on child failed: {e}")),
        Waited::Starved => {
            tracing::warn!(
                job = %job.safe_name,
                timeout_secs = timeout.as_secs(),
                "activity timeout exceeded, stopping backend"
            );
            signal::terminate_gracefully(&mut child, KILL_GRACE).await;
            Attempt::TimedOut
        }
        Waited::Cancelled => {
            signal::terminate_gracefully(&mut child, KILL_GRACE).await;
            Attempt::Cancelled
        }
    };

    watchdog.abort();
    stdin_task.abort();

    // The child is gone, so the pumps see EOF promptly.
    let _ = tokio::time::timeout(PUMP_DRAIN, async {
        while pumps.join_next().await.is_some() {}
    })
    .await;

    outcome
}

/// Assemble the per-stream writer chains.
///
/// Dashboard runs route through taps into the rings; `--no-ui` runs mirror
/// the child's streams onto the process's own, with the structured backend
/// still filtered for readability and usage accounting in both cases.
fn build_sinks(
    index: usize,
    ctx: &RunContext,
    monitor: &Arc<ActivityMonitor>,
    out_ring: &Arc<LineRing>,
    err_ring: &Arc<LineRing>,
) -> (Box<dyn StreamSink>, Box<dyn StreamSink>) {
    let structured = ctx.settings.backend.has_structured_stream();

    let out_sink: Box<dyn StreamSink> = if ctx.ui.is_enabled() {
        let tap = LogTap::new(
            StreamKind::Stdout,
            index,
            Arc::clone(monitor),
            Arc::clone(out_ring),
            Arc::clone(err_ring),
            ctx.ui.clone(),
        );
        if structured {
            Box::new(JsonFormatter::new(
                Box::new(tap),
                Arc::clone(monitor),
                Some(usage_callback(index, ctx)),
            ))
        } else {
            Box::new(tap)
        }
    } else if structured {
        Box::new(JsonFormatter::new(
            Box::new(ActivityWriter::new(std::io::stdout(), Arc::clone(monitor))),
            Arc::clone(monitor),
            Some(usage_callback(index, ctx)),
        ))
    } else {
        Box::new(ActivityWriter::new(std::io::stdout(), Arc::clone(monitor)))
    };

    let err_sink: Box<dyn StreamSink> = if ctx.ui.is_enabled() {
        Box::new(LogTap::new(
            StreamKind::Stderr,
            index,
            Arc::clone(monitor),
            Arc::clone(out_ring),
            Arc::clone(err_ring),
            ctx.ui.clone(),
        ))
    } else {
        Box::new(ActivityWriter::new(std::io::stderr(), Arc::clone(monitor)))
    };

    (out_sink, err_sink)
}

/// Usage sink: add into the shared aggregate, best-effort per-job update.
fn usage_callback(index: usize, ctx: &RunContext) -> UsageCallback {
    let aggregate = Arc::clone(&ctx.aggregate);
    let ui = ctx.ui.clone();
    Box::new(move |usage| {
        aggregate.lock().add(usage);
        ui.try_send(UiEvent::TokenUsageUpdate { index, usage });
    })
}

/// Copy a child stream into its log file and sink until EOF.
async fn pump<R>(mut reader: R, mut file: fs::File, mut sink: Box<dyn StreamSink>)
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    let mut buf = [0u8; 8192];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let _ = file.write_all(&buf[..n]);
                let _ = sink.write(&buf[..n]);
            }
        }
    }
    sink.finish();
    let _ = file.flush();
}

/// Open a log file append-create, owner-only on Unix.
fn open_log(path: &Path) -> Result<fs::File, CoreError> {
    let mut options = fs::OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options
        .open(path)
        .map_err(|e| CoreError::io(path.display().to_string(), e))
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
