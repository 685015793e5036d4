// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run orchestration: prepare inputs, drive the bounded worker pool,
//! account for the outcome.

use crate::supervisor::{self, RunContext};
use crate::ui::UiSender;
use crate::{backend, discovery, planner, shutdown::Shutdown};
use herd_core::{
    Backend, CoreError, Failure, Mode, Settings, TokenUsage, UiEvent, EXIT_CANCELLED, EXIT_PANIC,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Grace window for workers to drain after a cancellation request.
const SHUTDOWN_DRAIN: Duration = Duration::from_secs(30);

/// Final accounting of a run.
#[derive(Debug)]
pub struct RunReport {
    pub total: usize,
    pub succeeded: usize,
    pub failures: Vec<Failure>,
    pub aggregate: TokenUsage,
    pub backend: Backend,
    /// Set when discovery found nothing to work on; the run is still a
    /// success.
    pub nothing_to_do: Option<String>,
}

impl RunReport {
    fn empty(backend: Backend, reason: String) -> Self {
        Self {
            total: 0,
            succeeded: 0,
            failures: Vec::new(),
            aggregate: TokenUsage::default(),
            backend,
            nothing_to_do: Some(reason),
        }
    }
}

/// Execute a full run: discovery, planning, supervised execution, report.
///
/// Preparation errors are fatal and returned; per-job failures land in the
/// report. Cancellation drains workers for up to 30 seconds before giving
/// up with `ShutdownTimeout`.
pub async fn run(
    settings: Settings,
    ui: UiSender,
    shutdown: Shutdown,
) -> Result<RunReport, CoreError> {
    let settings = settings.validated()?;

    if !settings.dry_run {
        backend::preflight(&settings).await?;
    }

    let entries = discovery::read_entries(
        &settings.issues_dir,
        settings.mode,
        settings.include_completed,
    )?;
    let entries = match settings.mode {
        Mode::PrReview => discovery::filter_unresolved(entries),
        Mode::PrdTasks => entries,
    };
    if entries.is_empty() {
        let reason = match settings.mode {
            Mode::PrReview => format!(
                "No unresolved issues in {} — nothing to do.",
                settings.issues_dir.display()
            ),
            Mode::PrdTasks => format!(
                "No pending tasks in {} — nothing to do.",
                settings.issues_dir.display()
            ),
        };
        return Ok(RunReport::empty(settings.backend, reason));
    }

    let groups = discovery::group_by_code_file(entries);
    if settings.grouped && settings.mode == Mode::PrReview {
        discovery::write_grouped_summaries(&settings.issues_dir, &groups)?;
    }

    let prompt_root = create_prompt_root(&settings.pr)?;
    let jobs: Vec<Arc<_>> = planner::plan_jobs(&settings, &groups, &prompt_root)?
        .into_iter()
        .map(Arc::new)
        .collect();
    let total = jobs.len();
    tracing::info!(
        total,
        mode = %settings.mode,
        backend = %settings.backend,
        concurrency = settings.concurrency,
        "planned jobs"
    );

    for (index, job) in jobs.iter().enumerate() {
        ui.send(UiEvent::JobQueued {
            index,
            code_files: job.code_files.clone(),
            issue_count: job.issue_count(),
            safe_name: job.safe_name.clone(),
            out_log: job.out_log.clone(),
            err_log: job.err_log.clone(),
        })
        .await;
    }

    let ctx = Arc::new(RunContext {
        settings: Arc::new(settings.clone()),
        ui: ui.clone(),
        shutdown: shutdown.clone(),
        failures: Arc::new(Mutex::new(Vec::new())),
        aggregate: Arc::new(Mutex::new(TokenUsage::default())),
    });

    let semaphore = Arc::new(Semaphore::new(settings.concurrency.max(1)));
    let mut workers: JoinSet<(usize, bool)> = JoinSet::new();
    let mut worker_jobs: HashMap<tokio::task::Id, usize> = HashMap::new();

    let mut queue = jobs.iter().cloned().enumerate();
    for (index, job) in queue.by_ref() {
        let permit = tokio::select! {
            permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
            () = shutdown.cancelled() => {
                ui.send(UiEvent::JobFinished { index, ok: false, exit: EXIT_CANCELLED }).await;
                break;
            }
        };
        let ctx = Arc::clone(&ctx);
        let handle = workers.spawn(async move {
            let _permit = permit;
            let ok = supervisor::run_job(index, job, ctx).await;
            (index, ok)
        });
        worker_jobs.insert(handle.id(), index);
    }
    // Jobs never handed to a worker still owe their terminal event.
    for (index, _job) in queue {
        ui.send(UiEvent::JobFinished {
            index,
            ok: false,
            exit: EXIT_CANCELLED,
        })
        .await;
    }

    let mut succeeded = 0usize;
    let finished_cleanly = tokio::select! {
        () = drain_workers(&mut workers, &worker_jobs, &jobs, &ctx, &mut succeeded) => true,
        () = shutdown.cancelled() => false,
    };
    if !finished_cleanly {
        tracing::warn!("shutdown requested — waiting for running jobs to stop");
        if !ui.is_enabled() {
            eprintln!("Interrupt received — waiting for running jobs to stop...");
        }
        let drained = tokio::time::timeout(
            SHUTDOWN_DRAIN,
            drain_workers(&mut workers, &worker_jobs, &jobs, &ctx, &mut succeeded),
        )
        .await;
        if drained.is_err() {
            return Err(CoreError::ShutdownTimeout);
        }
    }

    let failures = ctx.failures.lock().clone();
    let aggregate = *ctx.aggregate.lock();
    Ok(RunReport {
        total,
        succeeded,
        failures,
        aggregate,
        backend: settings.backend,
        nothing_to_do: None,
    })
}

/// Join workers until the set is empty, containing any panics.
///
/// A panicking worker is recorded as a failure with a synthetic exit status
/// and its terminal event is emitted on its behalf; the remaining workers
/// keep running.
async fn drain_workers(
    workers: &mut JoinSet<(usize, bool)>,
    worker_jobs: &HashMap<tokio::task::Id, usize>,
    jobs: &[Arc<herd_core::Job>],
    ctx: &RunContext,
    succeeded: &mut usize,
) {
    while let Some(joined) = workers.join_next_with_id().await {
        match joined {
            Ok((_id, (_index, ok))) => {
                if ok {
                    *succeeded += 1;
                }
            }
            Err(join_err) => {
                let index = worker_jobs.get(&join_err.id()).copied();
                let panic_msg = if join_err.is_panic() {
                    panic_message(join_err.into_panic())
                } else {
                    join_err.to_string()
                };
                tracing::error!(?index, panic = %panic_msg, "worker panicked");
                if let Some(index) = index {
                    if let Some(job) = jobs.get(index) {
                        ctx.failures.lock().push(Failure {
                            code_file: job.display_code_file(),
                            exit_code: EXIT_PANIC,
                            out_log: job.out_log.clone(),
                            err_log: job.err_log.clone(),
                            error: format!("worker panicked: {panic_msg}"),
                        });
                    }
                    ctx.ui
                        .send(UiEvent::JobFinished {
                            index,
                            ok: false,
                            exit: EXIT_PANIC,
                        })
                        .await;
                }
            }
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Create `.tmp/codex-prompts/pr-<pr>` (0755) and return its absolute path.
fn create_prompt_root(pr: &str) -> Result<PathBuf, CoreError> {
    let root = PathBuf::from(".tmp/codex-prompts").join(format!("pr-{pr}"));
    fs::create_dir_all(&root).map_err(|e| CoreError::io(root.display().to_string(), e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&root, fs::Permissions::from_mode(0o755))
            .map_err(|e| CoreError::io(root.display().to_string(), e))?;
    }
    fs::canonicalize(&root).map_err(|e| CoreError::io(root.display().to_string(), e))
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
