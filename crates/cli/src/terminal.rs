// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Raw-mode terminal guard and the input thread feeding the dashboard.

use crossterm::cursor::{Hide, Show};
use crossterm::event::{Event, KeyCode, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Key and resize events after translation from crossterm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    SelectPrev,
    SelectNext,
    ScrollPageUp,
    ScrollPageDown,
    ScrollHalfUp,
    ScrollHalfDown,
    ScrollHome,
    ScrollEnd,
    Quit,
    Resize(u16, u16),
}

/// Owns raw mode and the alternate screen; restores both on drop.
pub struct TerminalGuard {
    stop: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl TerminalGuard {
    /// Enter raw mode and start the blocking input-poll thread.
    pub fn enter(input_tx: mpsc::UnboundedSender<InputEvent>) -> anyhow::Result<Self> {
        crossterm::terminal::enable_raw_mode()?;
        execute!(std::io::stdout(), EnterAlternateScreen, Hide)?;

        let stop = Arc::new(AtomicBool::new(false));
        let stop_thread = Arc::clone(&stop);
        let thread = std::thread::spawn(move || {
            while !stop_thread.load(Ordering::Relaxed) {
                if !crossterm::event::poll(Duration::from_millis(200)).unwrap_or(false) {
                    continue;
                }
                let Ok(event) = crossterm::event::read() else {
                    continue;
                };
                let mapped = match event {
                    Event::Key(key) => map_key(key.code, key.modifiers),
                    Event::Resize(width, height) => Some(InputEvent::Resize(width, height)),
                    _ => None,
                };
                if let Some(mapped) = mapped {
                    if input_tx.send(mapped).is_err() {
                        return;
                    }
                }
            }
        });

        Ok(Self {
            stop,
            thread: Some(thread),
        })
    }
}

fn map_key(code: KeyCode, modifiers: KeyModifiers) -> Option<InputEvent> {
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        return Some(InputEvent::Quit);
    }
    match code {
        KeyCode::Up | KeyCode::Char('k') => Some(InputEvent::SelectPrev),
        KeyCode::Down | KeyCode::Char('j') => Some(InputEvent::SelectNext),
        KeyCode::PageUp | KeyCode::Char('b') => Some(InputEvent::ScrollPageUp),
        KeyCode::PageDown | KeyCode::Char('f') => Some(InputEvent::ScrollPageDown),
        KeyCode::Char('u') => Some(InputEvent::ScrollHalfUp),
        KeyCode::Char('d') => Some(InputEvent::ScrollHalfDown),
        KeyCode::Home => Some(InputEvent::ScrollHome),
        KeyCode::End => Some(InputEvent::ScrollEnd),
        KeyCode::Char('q') => Some(InputEvent::Quit),
        _ => None,
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        let _ = execute!(std::io::stdout(), Show, LeaveAlternateScreen);
        let _ = crossterm::terminal::disable_raw_mode();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[cfg(test)]
#[path = "terminal_tests.rs"]
mod tests;
