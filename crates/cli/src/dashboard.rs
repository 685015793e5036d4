// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal dashboard: one sidebar row per job, live logs and usage for the
//! selected job.
//!
//! Single consumer of the scheduler's event channel. The loop redraws on
//! every event, input key and spinner tick, and exits when the channel
//! closes (the run is over). It never touches stdout/stderr directly.

use crate::terminal::InputEvent;
use herd_core::{format_count, format_runtime, Backend, JobStatus, TokenUsage, UiEvent};
use herd_engine::Shutdown;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{List, ListItem, Paragraph};
use ratatui::{Frame, Terminal};
use std::io::Stdout;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

const TICK: Duration = Duration::from_millis(120);
const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const HELP: &str = "↑/k ↓/j select · PgUp/PgDn b/f u/d scroll · Home/End · q quit";

/// Per-job display state, fed exclusively by scheduler events.
struct JobView {
    safe_name: String,
    code_files: Vec<String>,
    issue_count: usize,
    out_log: PathBuf,
    err_log: PathBuf,
    status: JobStatus,
    started_at: Option<Instant>,
    finished_at: Option<Instant>,
    last_out: Vec<String>,
    last_err: Vec<String>,
    usage: TokenUsage,
}

impl JobView {
    fn runtime(&self) -> Option<Duration> {
        let started = self.started_at?;
        match self.status {
            JobStatus::Pending => None,
            JobStatus::Running => Some(started.elapsed()),
            JobStatus::Success | JobStatus::Failed(_) => self
                .finished_at
                .map(|finished| finished.saturating_duration_since(started)),
        }
    }

    fn runtime_label(&self) -> &'static str {
        match self.status {
            JobStatus::Pending | JobStatus::Running => "Runtime",
            JobStatus::Success => "Completed in",
            JobStatus::Failed(_) => "Ran for",
        }
    }
}

pub struct Dashboard {
    backend: Backend,
    jobs: Vec<JobView>,
    selected: usize,
    /// 0 keeps the log viewport glued to the newest line.
    scroll_from_bottom: usize,
    spinner_frame: usize,
    height: u16,
    log_viewport_height: usize,
}

impl Dashboard {
    pub fn new(backend: Backend) -> Self {
        let (_, height) = crossterm::terminal::size().unwrap_or((80, 24));
        Self {
            backend,
            jobs: Vec::new(),
            selected: 0,
            scroll_from_bottom: 0,
            spinner_frame: 0,
            height,
            log_viewport_height: 1,
        }
    }

    /// Consume events and input until the run is over.
    pub async fn run(
        mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
        mut events: mpsc::Receiver<UiEvent>,
        mut input: mpsc::UnboundedReceiver<InputEvent>,
        shutdown: Shutdown,
    ) -> anyhow::Result<()> {
        let mut tick = tokio::time::interval(TICK);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            terminal.draw(|frame| self.render(frame))?;
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.apply(event),
                    // Channel closed: the scheduler is done.
                    None => break,
                },
                Some(event) = input.recv() => {
                    if event == InputEvent::Quit {
                        shutdown.cancel();
                    } else {
                        self.handle_input(event);
                    }
                }
                _ = tick.tick() => {
                    if self.any_running() {
                        self.spinner_frame = self.spinner_frame.wrapping_add(1);
                    }
                }
            }
        }
        terminal.draw(|frame| self.render(frame))?;
        Ok(())
    }

    fn any_running(&self) -> bool {
        self.jobs
            .iter()
            .any(|job| job.status == JobStatus::Running)
    }

    fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::JobQueued {
                index,
                code_files,
                issue_count,
                safe_name,
                out_log,
                err_log,
            } => {
                if index == self.jobs.len() {
                    self.jobs.push(JobView {
                        safe_name,
                        code_files,
                        issue_count,
                        out_log,
                        err_log,
                        status: JobStatus::Pending,
                        started_at: None,
                        finished_at: None,
                        last_out: Vec::new(),
                        last_err: Vec::new(),
                        usage: TokenUsage::default(),
                    });
                }
            }
            UiEvent::JobStarted { index } => {
                if let Some(job) = self.jobs.get_mut(index) {
                    job.status = JobStatus::Running;
                    job.started_at.get_or_insert_with(Instant::now);
                }
            }
            UiEvent::JobFinished { index, ok, exit } => {
                if let Some(job) = self.jobs.get_mut(index) {
                    job.status = if ok {
                        JobStatus::Success
                    } else {
                        JobStatus::Failed(exit)
                    };
                    job.finished_at = Some(Instant::now());
                }
                self.snap_selection();
            }
            UiEvent::JobLogUpdate { index, out, err } => {
                if let Some(job) = self.jobs.get_mut(index) {
                    job.last_out = out;
                    job.last_err = err;
                }
            }
            UiEvent::TokenUsageUpdate { index, usage } => {
                if let Some(job) = self.jobs.get_mut(index) {
                    job.usage.add(usage);
                }
            }
        }
    }

    /// After a job reaches a terminal state: follow the action — first
    /// running job, else first pending, else stay put.
    fn snap_selection(&mut self) {
        let next = self
            .jobs
            .iter()
            .position(|job| job.status == JobStatus::Running)
            .or_else(|| {
                self.jobs
                    .iter()
                    .position(|job| job.status == JobStatus::Pending)
            });
        if let Some(next) = next {
            if next != self.selected {
                self.selected = next;
                self.scroll_from_bottom = 0;
            }
        }
    }

    fn handle_input(&mut self, event: InputEvent) {
        let page = self.log_viewport_height.max(1);
        match event {
            InputEvent::SelectPrev => {
                if self.selected > 0 {
                    self.selected -= 1;
                    self.scroll_from_bottom = 0;
                }
            }
            InputEvent::SelectNext => {
                if self.selected + 1 < self.jobs.len() {
                    self.selected += 1;
                    self.scroll_from_bottom = 0;
                }
            }
            InputEvent::ScrollPageUp => self.scroll_up(page),
            InputEvent::ScrollPageDown => self.scroll_down(page),
            InputEvent::ScrollHalfUp => self.scroll_up(page.div_ceil(2)),
            InputEvent::ScrollHalfDown => self.scroll_down(page.div_ceil(2)),
            InputEvent::ScrollHome => self.scroll_from_bottom = self.max_scroll(),
            InputEvent::ScrollEnd => self.scroll_from_bottom = 0,
            InputEvent::Resize(_, height) => {
                self.height = height;
                self.scroll_from_bottom = self.scroll_from_bottom.min(self.max_scroll());
            }
            InputEvent::Quit => {}
        }
    }

    fn scroll_up(&mut self, lines: usize) {
        self.scroll_from_bottom = self
            .scroll_from_bottom
            .saturating_add(lines)
            .min(self.max_scroll());
    }

    fn scroll_down(&mut self, lines: usize) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(lines);
    }

    fn max_scroll(&self) -> usize {
        let merged = self
            .jobs
            .get(self.selected)
            .map(|job| merged_log_lines(job).len())
            .unwrap_or(0);
        merged.saturating_sub(self.log_viewport_height.max(1))
    }

    fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        if area.height < 7 || area.width < 12 {
            return;
        }

        let row = |y: u16| Rect::new(area.x, area.y + y, area.width, 1);

        let done = self
            .jobs
            .iter()
            .filter(|job| job.status.is_terminal())
            .count();
        let title = format!("herd — {} jobs · {done} done", self.jobs.len());
        frame.render_widget(
            Paragraph::new(title).style(Style::default().add_modifier(Modifier::BOLD)),
            row(0),
        );
        frame.render_widget(
            Paragraph::new(HELP).style(Style::default().fg(Color::DarkGray)),
            row(1),
        );
        let separator = "─".repeat(area.width as usize);
        frame.render_widget(
            Paragraph::new(separator.clone()).style(Style::default().fg(Color::DarkGray)),
            row(2),
        );

        let content = Rect::new(
            area.x,
            area.y + 3,
            area.width,
            content_height(area.height),
        );
        let sidebar_w = sidebar_width(area.width);
        let sidebar = Rect::new(content.x, content.y, sidebar_w, content.height);
        let main = Rect::new(
            content.x + sidebar_w,
            content.y,
            content.width.saturating_sub(sidebar_w),
            content.height,
        );
        self.render_sidebar(frame, sidebar);
        self.render_main(frame, main);

        let bottom = area.y + 3 + content.height;
        frame.render_widget(
            Paragraph::new(separator).style(Style::default().fg(Color::DarkGray)),
            Rect::new(area.x, bottom, area.width, 1),
        );
        frame.render_widget(
            Paragraph::new(self.status_line()),
            Rect::new(area.x, bottom + 1, area.width, 1),
        );
    }

    fn status_line(&self) -> String {
        let mut running = 0usize;
        let mut pending = 0usize;
        let mut success = 0usize;
        let mut failed = 0usize;
        for job in &self.jobs {
            match job.status {
                JobStatus::Pending => pending += 1,
                JobStatus::Running => running += 1,
                JobStatus::Success => success += 1,
                JobStatus::Failed(_) => failed += 1,
            }
        }
        format!("{running} running · {pending} pending · {success} ok · {failed} failed")
    }

    fn icon(&self, status: JobStatus) -> (&'static str, Color) {
        match status {
            JobStatus::Pending => ("⏸", Color::DarkGray),
            JobStatus::Running => (
                SPINNER[self.spinner_frame % SPINNER.len()],
                Color::Cyan,
            ),
            JobStatus::Success => ("✓", Color::Green),
            JobStatus::Failed(_) => ("✗", Color::Red),
        }
    }

    fn render_sidebar(&self, frame: &mut Frame, area: Rect) {
        let height = area.height as usize;
        if height == 0 {
            return;
        }
        // Keep the selected row in view.
        let offset = (self.selected + 1).saturating_sub(height);

        let items: Vec<ListItem> = self
            .jobs
            .iter()
            .enumerate()
            .skip(offset)
            .take(height)
            .map(|(idx, job)| {
                let (icon, color) = self.icon(job.status);
                let line = Line::from(vec![
                    Span::styled(format!("{icon} "), Style::default().fg(color)),
                    Span::raw(job.safe_name.clone()),
                    Span::styled(
                        format!(" {}f {}i", job.code_files.len(), job.issue_count),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]);
                let style = if idx == self.selected {
                    Style::default()
                        .bg(Color::DarkGray)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(line).style(style)
            })
            .collect();
        frame.render_widget(List::new(items), area);
    }

    fn render_main(&mut self, frame: &mut Frame, area: Rect) {
        let Some(job) = self.jobs.get(self.selected) else {
            frame.render_widget(
                Paragraph::new("waiting for jobs…")
                    .style(Style::default().fg(Color::DarkGray)),
                area,
            );
            return;
        };

        let mut meta: Vec<Line> = Vec::new();
        meta.push(Line::from(Span::styled(
            job.safe_name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        meta.push(Line::from(format!("Files: {}", job.code_files.join(", "))));

        let status_text = match job.status {
            JobStatus::Failed(exit) => {
                format!("Issues: {} | Status: {} (exit {exit})", job.issue_count, job.status)
            }
            _ => format!("Issues: {} | Status: {}", job.issue_count, job.status),
        };
        meta.push(Line::from(status_text));
        meta.push(Line::from(format!(
            "{}: {}",
            job.runtime_label(),
            format_runtime(job.runtime())
        )));

        if self.backend.has_structured_stream() && !job.usage.is_zero() {
            meta.push(Line::from(format!(
                "Tokens: in {} · out {} · total {}",
                format_count(job.usage.input_tokens),
                format_count(job.usage.output_tokens),
                format_count(job.usage.total()),
            )));
            meta.push(Line::from(Span::styled(
                format!(
                    "Cache: +{} created · {} read",
                    format_count(job.usage.cache_creation_tokens),
                    format_count(job.usage.cache_read_tokens),
                ),
                Style::default().fg(Color::DarkGray),
            )));
        }

        meta.push(Line::from(Span::styled(
            format!("out: {}", job.out_log.display()),
            Style::default().fg(Color::DarkGray),
        )));
        meta.push(Line::from(Span::styled(
            format!("err: {}", job.err_log.display()),
            Style::default().fg(Color::DarkGray),
        )));
        meta.push(Line::from(""));

        let merged = merged_log_lines(job);

        // The log viewport keeps at least 6 rows; meta yields when cramped.
        let meta_height = (meta.len() as u16).min(area.height.saturating_sub(6));
        frame.render_widget(
            Paragraph::new(meta),
            Rect::new(area.x, area.y, area.width, meta_height),
        );

        let log_area = Rect::new(
            area.x,
            area.y + meta_height,
            area.width,
            area.height.saturating_sub(meta_height),
        );
        self.log_viewport_height = log_area.height as usize;

        if merged.is_empty() {
            frame.render_widget(
                Paragraph::new("(no output yet)").style(Style::default().fg(Color::DarkGray)),
                log_area,
            );
            return;
        }

        let viewport = self.log_viewport_height.max(1);
        let start = merged
            .len()
            .saturating_sub(viewport + self.scroll_from_bottom);
        let visible: Vec<Line> = merged
            .iter()
            .skip(start)
            .take(viewport)
            .map(|line| {
                if line == "[stderr]" {
                    Line::from(Span::styled(
                        line.clone(),
                        Style::default().fg(Color::Yellow),
                    ))
                } else {
                    Line::from(line.clone())
                }
            })
            .collect();
        frame.render_widget(Paragraph::new(visible), log_area);
    }
}

/// Merged live view: stdout lines, then stderr behind a separator.
fn merged_log_lines(job: &JobView) -> Vec<String> {
    let mut merged = job.last_out.clone();
    if !job.last_err.is_empty() {
        merged.push("[stderr]".to_string());
        merged.extend(job.last_err.iter().cloned());
    }
    merged
}

/// Sidebar width: a quarter of the terminal clamped to 30–50 columns, never
/// starving the main pane, never under 10.
fn sidebar_width(total: u16) -> u16 {
    let ideal = (total / 4).clamp(30, 50);
    ideal.min(total.saturating_sub(20)).max(10)
}

/// Rows left for the sidebar/main panes after the fixed chrome.
fn content_height(total: u16) -> u16 {
    total.saturating_sub(6)
}

#[cfg(test)]
#[path = "dashboard_tests.rs"]
mod tests;
