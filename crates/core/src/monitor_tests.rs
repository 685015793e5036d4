// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::thread;

#[test]
fn elapsed_grows_without_activity() {
    let monitor = ActivityMonitor::new();
    thread::sleep(Duration::from_millis(20));
    assert!(monitor.elapsed() >= Duration::from_millis(20));
}

#[test]
fn record_resets_elapsed() {
    let monitor = ActivityMonitor::new();
    thread::sleep(Duration::from_millis(20));
    monitor.record();
    assert!(monitor.elapsed() < Duration::from_millis(20));
}
