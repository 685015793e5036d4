// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

#[test]
fn starts_uncancelled() {
    assert!(!Shutdown::new().is_cancelled());
}

#[test]
fn cancel_is_sticky_and_idempotent() {
    let shutdown = Shutdown::new();
    shutdown.cancel();
    shutdown.cancel();
    assert!(shutdown.is_cancelled());
}

#[test]
fn clones_share_state() {
    let shutdown = Shutdown::new();
    let clone = shutdown.clone();
    shutdown.cancel();
    assert!(clone.is_cancelled());
}

#[tokio::test]
async fn cancelled_resolves_after_cancel() {
    let shutdown = Shutdown::new();
    let waiter = shutdown.clone();
    let handle = tokio::spawn(async move { waiter.cancelled().await });

    tokio::time::sleep(Duration::from_millis(10)).await;
    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn cancelled_resolves_immediately_when_already_cancelled() {
    let shutdown = Shutdown::new();
    shutdown.cancel();
    tokio::time::timeout(Duration::from_millis(100), shutdown.cancelled())
        .await
        .unwrap();
}
