// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn snapshot_preserves_insertion_order() {
    let ring = LineRing::new(10);
    ring.push("a");
    ring.push("b");
    ring.push("c");
    assert_eq!(ring.snapshot(), vec!["a", "b", "c"]);
}

#[test]
fn full_ring_drops_oldest() {
    let ring = LineRing::new(3);
    for line in ["1", "2", "3", "4", "5"] {
        ring.push(line);
    }
    assert_eq!(ring.snapshot(), vec!["3", "4", "5"]);
}

#[test]
fn empty_lines_are_ignored() {
    let ring = LineRing::new(3);
    ring.push("a");
    ring.push("");
    ring.push("b");
    assert_eq!(ring.snapshot(), vec!["a", "b"]);
}

#[test]
fn zero_capacity_is_clamped_to_one() {
    let ring = LineRing::new(0);
    ring.push("only");
    ring.push("latest");
    assert_eq!(ring.snapshot(), vec!["latest"]);
}

#[test]
fn snapshot_is_a_copy() {
    let ring = LineRing::new(2);
    ring.push("a");
    let snap = ring.snapshot();
    ring.push("b");
    ring.push("c");
    assert_eq!(snap, vec!["a"]);
    assert_eq!(ring.snapshot(), vec!["b", "c"]);
}

#[yare::parameterized(
    capacity_1  = { 1, 8 },
    capacity_4  = { 4, 8 },
    capacity_64 = { 64, 8 },
)]
fn snapshot_never_exceeds_capacity(capacity: usize, appends: usize) {
    let ring = LineRing::new(capacity);
    for i in 0..appends {
        ring.push(&format!("line-{i}"));
    }
    assert!(ring.snapshot().len() <= capacity);
    assert_eq!(ring.snapshot().len(), appends.min(capacity));
}
