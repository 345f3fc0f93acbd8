//! Plain terminal rendering of boards, statistics and the activity feed.
//!
//! Every renderer returns a `String` so callers decide where it goes.

use std::fmt::Write;

use console::style;

use crate::board::activity::{self, ActivityDay};
use crate::board::filter::is_overdue;
use crate::board::models::{BoardView, Priority, Task, Timestamp};
use crate::board::stats::{DashboardSummary, TaskStats};
use crate::ui::icons::{
    ACTIVITY, BOARD, CHECK, COLUMN, HIGH, LOW, MEDIUM, OPEN, OVERDUE, SPARKLE, STATS,
};

fn priority_icon(priority: Priority) -> String {
    match priority {
        Priority::High => HIGH.to_string(),
        Priority::Medium => MEDIUM.to_string(),
        Priority::Low => LOW.to_string(),
    }
}

fn task_line(task: &Task, now: Timestamp) -> String {
    let status = if task.completed {
        CHECK.to_string()
    } else if is_overdue(task, now) {
        OVERDUE.to_string()
    } else {
        OPEN.to_string()
    };
    let title = if task.completed {
        style(&task.title).dim().to_string()
    } else {
        task.title.clone()
    };
    let due = task
        .due_date
        .map(|d| format!(" {}", style(format!("due {}", d.format("%b %-d"))).dim()))
        .unwrap_or_default();
    format!("{}{}{}{}", status, priority_icon(task.priority), title, due)
}

pub fn render_board(view: &BoardView, now: Timestamp) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}{}", BOARD, style(&view.board.title).bold());
    if let Some(description) = &view.board.description {
        let _ = writeln!(out, "   {}", style(description).dim());
    }
    if view.active_filters > 0 {
        let _ = writeln!(out, "   {} filter(s) active", view.active_filters);
    }
    for column in &view.columns {
        let _ = writeln!(
            out,
            "\n{}{} {}",
            COLUMN,
            style(&column.column.title).cyan().bold(),
            style(format!("({})", column.tasks.len())).dim()
        );
        if column.tasks.is_empty() {
            let _ = writeln!(out, "     {}", style("no tasks").dim());
        }
        for task in &column.tasks {
            let _ = writeln!(out, "     {}", task_line(task, now));
        }
    }
    out
}

pub fn render_stats(stats: &TaskStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}{}", STATS, style("Statistics").bold());
    let _ = writeln!(out, "   Total tasks:      {}", stats.total);
    let _ = writeln!(
        out,
        "   Completed:        {} ({:.1}%)",
        stats.completed, stats.completion_rate
    );
    let _ = writeln!(out, "   Overdue:          {}", style(stats.overdue).red());
    let _ = writeln!(out, "   Due today:        {}", stats.due_today);
    let _ = writeln!(out, "   High priority:    {}", stats.high_priority);
    let _ = writeln!(
        out,
        "   Avg. completion:  {} days",
        stats.avg_completion_days
    );
    out
}

pub fn render_dashboard(summary: &DashboardSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}{} across {} board(s), {} open high priority",
        SPARKLE,
        style("Dashboard").bold(),
        summary.board_count,
        summary.open_high_priority
    );
    for board in &summary.boards {
        let _ = writeln!(
            out,
            "   {:<32} {}/{} done ({:.0}%)",
            board.title, board.completed, board.total, board.percent
        );
    }
    out
}

pub fn render_activity(days: &[ActivityDay], now: Timestamp) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}{}", ACTIVITY, style("Activity").bold());
    if days.is_empty() {
        let _ = writeln!(out, "   {}", style("No activity yet").dim());
    }
    for day in days {
        let _ = writeln!(out, "\n   {}", style(&day.header).underlined());
        for entry in &day.entries {
            let _ = writeln!(
                out,
                "   {} {} {}",
                style(&entry.actor_name).bold(),
                activity::describe(entry),
                style(activity::time_ago(entry.timestamp, now)).dim()
            );
        }
    }
    out
}
