// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing setup.
//!
//! With the dashboard active the terminal belongs to the TUI, so traces go
//! to a file under the prompt tree; in `--no-ui` mode they go to stderr.
//! `RUST_LOG` filters as usual.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const LOG_DIR: &str = ".tmp/codex-prompts";
const LOG_FILE: &str = "herd.log";

pub fn init(ui_active: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if ui_active {
        let Some(file) = open_log_file() else {
            // No usable log file; better silent than drawing over the TUI.
            return;
        };
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Arc::new(file))
            .with_ansi(false)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

fn open_log_file() -> Option<fs::File> {
    let dir = Path::new(LOG_DIR);
    fs::create_dir_all(dir).ok()?;
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE))
        .ok()
}
