// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! herd — batch-drive coding agents over Markdown issue and task files.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod cli;
mod dashboard;
mod logging;
mod terminal;

use clap::Parser;
use dashboard::Dashboard;
use herd_engine::{Shutdown, UiSender, UI_CHANNEL_CAPACITY};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::process::ExitCode;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(1)
        }
    }
}

async fn run() -> anyhow::Result<ExitCode> {
    let args = cli::Cli::parse();
    let use_ui = !args.no_ui;
    let settings = cli::resolve(args)?;
    logging::init(use_ui);
    tracing::info!(
        mode = %settings.mode,
        backend = %settings.backend,
        issues_dir = %settings.issues_dir.display(),
        "starting run"
    );

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    let report = if use_ui {
        let backend = settings.backend;
        let (event_tx, event_rx) = mpsc::channel(UI_CHANNEL_CAPACITY);
        let (input_tx, input_rx) = mpsc::unbounded_channel();

        let guard = terminal::TerminalGuard::enter(input_tx)?;
        let mut term = Terminal::new(CrosstermBackend::new(std::io::stdout()))?;

        let runner = tokio::spawn(herd_engine::run(
            settings,
            UiSender::new(event_tx),
            shutdown.clone(),
        ));
        let dashboard =
            Dashboard::new(backend).run(&mut term, event_rx, input_rx, shutdown.clone());
        let dashboard_result = dashboard.await;

        // Restore the terminal before anything is printed.
        drop(guard);
        dashboard_result?;
        runner.await??
    } else {
        herd_engine::run(settings, UiSender::disabled(), shutdown).await?
    };

    herd_engine::print_summary(&report);
    if report.failures.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

/// Cancel the run on INT or TERM.
fn spawn_signal_handler(shutdown: Shutdown) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let Ok(mut term) = signal(SignalKind::terminate()) else {
                let _ = tokio::signal::ctrl_c().await;
                shutdown.cancel();
                return;
            };
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
        }
        shutdown.cancel();
    });
}
