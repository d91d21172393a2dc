use std::fmt::Write as _;
use std::io::{self, IsTerminal, Write};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use unicode_width::UnicodeWidthStr;

use crate::aggregate::{DisplayStatus, GroupSummary, offers_actions, resolve_status};
use crate::controller::{Renderer, ViewSnapshot};
use crate::datetime::DateStyle;
use crate::error::TransportError;
use crate::fetcher::LoadState;
use crate::mutation::Notifier;
use crate::task::{Payload, Task, TaskId};
use crate::transport::StatusChange;

/// Writes every snapshot as a plain-text frame.
pub struct TextRenderer<W> {
    out: Mutex<W>,
    style: DateStyle,
    color: bool,
}

impl TextRenderer<io::Stdout> {
    pub fn stdout(style: DateStyle) -> Self {
        let color = io::stdout().is_terminal();
        Self::new(io::stdout(), style, color)
    }
}

impl<W: Write + Send> TextRenderer<W> {
    pub fn new(out: W, style: DateStyle, color: bool) -> Self {
        Self {
            out: Mutex::new(out),
            style,
            color,
        }
    }
}

impl<W: Write + Send> Renderer for TextRenderer<W> {
    fn render(&self, snapshot: &ViewSnapshot) {
        let frame = render_snapshot(snapshot, &self.style, Utc::now(), self.color);
        let mut out = self.out.lock();
        if let Err(err) = out.write_all(frame.as_bytes()).and_then(|()| out.flush()) {
            tracing::error!(error = %err, "failed writing task view frame");
        }
    }
}

#[must_use]
pub fn render_snapshot(
    snapshot: &ViewSnapshot,
    style: &DateStyle,
    now: DateTime<Utc>,
    color: bool,
) -> String {
    let mut frame = String::new();

    let header = format!("TASKS · {}", style.long_day(style.today(now)));
    let _ = writeln!(frame, "{header}");
    let _ = writeln!(
        frame,
        "{}",
        "=".repeat(UnicodeWidthStr::width(header.as_str()))
    );
    // The loaded payload may predate the latest mode switch.
    let grouped = snapshot
        .load
        .payload()
        .map_or(snapshot.view.group_by, Payload::is_grouped);
    let mode = if grouped { "grouped by day" } else { "flat" };
    let _ = writeln!(frame, "view: {mode}");
    if let Some(overall) = snapshot.overall {
        let _ = writeln!(frame, "{}", summary_line(&overall));
    }
    let _ = writeln!(frame);

    match &snapshot.load {
        LoadState::Idle => {}
        LoadState::Pending => {
            let _ = writeln!(frame, "Loading tasks...");
        }
        LoadState::Failed(_) => {
            let _ = writeln!(
                frame,
                "{}",
                paint("Could not load tasks. Type `r` to try again.", "31", color)
            );
        }
        LoadState::Loaded(payload) if payload.is_empty() => {
            let _ = writeln!(frame, "No tasks.");
        }
        LoadState::Loaded(Payload::Flat(tasks)) => {
            for task in tasks {
                write_task(&mut frame, task, style, color, "");
            }
        }
        LoadState::Loaded(Payload::Grouped(groups)) => {
            for (group, summary) in groups.iter().zip(&snapshot.group_summaries) {
                let collapsed = snapshot.is_collapsed(group.day);
                let marker = if collapsed { "▶" } else { "▼" };
                let _ = writeln!(
                    frame,
                    "{marker} {} [{}]",
                    style.long_day(group.day),
                    group.day.format("%Y-%m-%d")
                );
                let _ = writeln!(frame, "  {}", summary_line(summary));
                if !collapsed {
                    for task in &group.tasks {
                        write_task(&mut frame, task, style, color, "  ");
                    }
                }
            }
        }
    }

    if snapshot.view.modal_open {
        let draft = &snapshot.view.draft;
        let _ = writeln!(frame);
        let _ = writeln!(frame, "--- new task ---");
        let _ = writeln!(frame, "title:       {}", draft.title);
        let _ = writeln!(frame, "description: {}", draft.description);
        let _ = writeln!(
            frame,
            "type:        {}",
            draft
                .task_type
                .map(|kind| kind.as_key().to_string())
                .unwrap_or_else(|| "(none)".to_string())
        );
    }

    frame
}

fn summary_line(summary: &GroupSummary) -> String {
    format!(
        "{} task(s) • {} completed • {} pending • {} canceled",
        summary.total, summary.completed, summary.pending, summary.canceled
    )
}

fn write_task(frame: &mut String, task: &Task, style: &DateStyle, color: bool, indent: &str) {
    let status = resolve_status(task);
    let badge = match status {
        DisplayStatus::Pending => paint("[PENDING]  ", "33", color),
        DisplayStatus::Completed => paint("[COMPLETED]", "36", color),
        DisplayStatus::Cancelled => paint("[CANCELLED]", "31", color),
    };
    let actions = if offers_actions(task) {
        "  [done|cancel]"
    } else {
        ""
    };
    let _ = writeln!(
        frame,
        "{indent}  {badge} #{} {} ({} · {}){actions}",
        task.id,
        task.title,
        task.task_type,
        style.short_timestamp(task.created_at)
    );
    if let Some(description) = task.description.as_deref().filter(|d| !d.trim().is_empty()) {
        let _ = writeln!(frame, "{indent}              {description}");
    }
}

fn paint(text: &str, code: &str, color: bool) -> String {
    if !color {
        return text.to_string();
    }
    format!("\x1b[{code}m{text}\x1b[0m")
}

/// Reports failed status changes on stderr.
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn mutation_failed(&self, change: StatusChange, id: &TaskId, error: &TransportError) {
        eprintln!(
            "! could not {} task {id}: {error}",
            change.path_segment()
        );
    }
}
