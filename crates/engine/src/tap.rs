// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Byte sinks between a child's output and the dashboard.

use crate::ui::UiSender;
use herd_core::{ActivityMonitor, LineRing, UiEvent};
use std::io::{self, Write};
use std::sync::Arc;

/// A sink in a child-output chain.
///
/// `finish` flushes any buffered partial line once the stream hits EOF.
/// Sinks never propagate write errors; the output chain must outlive any
/// single broken consumer.
pub trait StreamSink: Write + Send {
    fn finish(&mut self) {}
}

/// Which child stream a tap is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

/// Splits a child stream into a line ring and best-effort dashboard updates.
///
/// Carriage returns normalise to newlines so progress-bar style output still
/// becomes lines. Each write records activity, cuts any complete lines into
/// the ring matching this tap's polarity, and pushes a snapshot of both
/// rings onto the UI channel (dropped under back-pressure).
pub struct LogTap {
    kind: StreamKind,
    index: usize,
    monitor: Arc<ActivityMonitor>,
    out_ring: Arc<LineRing>,
    err_ring: Arc<LineRing>,
    ui: UiSender,
    buf: Vec<u8>,
}

impl LogTap {
    pub fn new(
        kind: StreamKind,
        index: usize,
        monitor: Arc<ActivityMonitor>,
        out_ring: Arc<LineRing>,
        err_ring: Arc<LineRing>,
        ui: UiSender,
    ) -> Self {
        Self {
            kind,
            index,
            monitor,
            out_ring,
            err_ring,
            ui,
            buf: Vec::new(),
        }
    }

    fn push_line(&self, line: &str) {
        match self.kind {
            StreamKind::Stdout => self.out_ring.push(line),
            StreamKind::Stderr => self.err_ring.push(line),
        }
    }

    fn emit_snapshot(&self) {
        self.ui.try_send(UiEvent::JobLogUpdate {
            index: self.index,
            out: self.out_ring.snapshot(),
            err: self.err_ring.snapshot(),
        });
    }
}

impl Write for LogTap {
    fn write(&mut self, payload: &[u8]) -> io::Result<usize> {
        if payload.is_empty() {
            return Ok(0);
        }
        self.monitor.record();
        for &b in payload {
            self.buf.push(if b == b'\r' { b'\n' } else { b });
        }
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let rest = self.buf.split_off(pos + 1);
            let raw = std::mem::replace(&mut self.buf, rest);
            let line = String::from_utf8_lossy(&raw);
            self.push_line(line.trim_end_matches('\n'));
        }
        self.emit_snapshot();
        Ok(payload.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl StreamSink for LogTap {
    fn finish(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let raw = std::mem::take(&mut self.buf);
        let line = String::from_utf8_lossy(&raw);
        self.push_line(line.trim_end_matches('\n'));
        self.emit_snapshot();
    }
}

/// Passthrough writer that keeps the activity monitor fed.
///
/// Used in `--no-ui` mode where the chain ends at the process's own
/// stdout/stderr and no tap is present to record activity.
pub struct ActivityWriter<W: Write + Send> {
    inner: W,
    monitor: Arc<ActivityMonitor>,
}

impl<W: Write + Send> ActivityWriter<W> {
    pub fn new(inner: W, monitor: Arc<ActivityMonitor>) -> Self {
        Self { inner, monitor }
    }
}

impl<W: Write + Send> Write for ActivityWriter<W> {
    fn write(&mut self, payload: &[u8]) -> io::Result<usize> {
        if !payload.is_empty() {
            self.monitor.record();
        }
        let _ = self.inner.write_all(payload);
        Ok(payload.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let _ = self.inner.flush();
        Ok(())
    }
}

impl<W: Write + Send> StreamSink for ActivityWriter<W> {}

#[cfg(test)]
#[path = "tap_tests.rs"]
mod tests;
