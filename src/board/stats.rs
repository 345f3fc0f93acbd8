//! Derived statistics over tasks: headline counts, time-range analytics,
//! distributions, per-board progress and subtask progress.

use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::filter::{is_due_today, is_overdue};
use super::models::{Board, Priority, Subtask, Task, Timestamp};

/// Longest histogram produced for the unbounded range.
const MAX_HISTOGRAM_DAYS: i64 = 365;

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Unrounded share in percent; renderers pick the precision.
fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "7d")]
    Week,
    #[default]
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
    #[serde(rename = "all")]
    All,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Week => "7d",
            Self::Month => "30d",
            Self::Quarter => "90d",
            Self::All => "all",
        }
    }

    pub fn days(&self) -> Option<i64> {
        match self {
            Self::Week => Some(7),
            Self::Month => Some(30),
            Self::Quarter => Some(90),
            Self::All => None,
        }
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "7d" => Ok(Self::Week),
            "30d" => Ok(Self::Month),
            "90d" => Ok(Self::Quarter),
            "all" => Ok(Self::All),
            _ => Err(format!("Invalid time range: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub overdue: usize,
    /// Open tasks due today.
    pub due_today: usize,
    pub high_priority: usize,
    /// Percentage, one decimal.
    pub completion_rate: f64,
    /// Mean of `updatedAt - createdAt` over completed tasks, in days.
    pub avg_completion_days: f64,
}

impl TaskStats {
    pub fn compute(tasks: &[&Task], now: Timestamp) -> Self {
        let total = tasks.len();
        let completed: Vec<&&Task> = tasks.iter().filter(|t| t.completed).collect();
        let avg_completion_days = if completed.is_empty() {
            0.0
        } else {
            let total_secs: i64 = completed
                .iter()
                .map(|t| (t.updated_at - t.created_at).num_seconds())
                .sum();
            round1(total_secs as f64 / completed.len() as f64 / 86_400.0)
        };
        Self {
            total,
            completed: completed.len(),
            overdue: tasks.iter().filter(|t| is_overdue(t, now)).count(),
            due_today: tasks
                .iter()
                .filter(|t| !t.completed && is_due_today(t, now))
                .count(),
            high_priority: tasks.iter().filter(|t| t.priority == Priority::High).count(),
            completion_rate: percent(completed.len(), total),
            avg_completion_days,
        }
    }
}

/// Tasks created within the trailing window of `range`.
pub fn scope_to_range<'a>(tasks: &[&'a Task], range: TimeRange, now: Timestamp) -> Vec<&'a Task> {
    match range.days() {
        None => tasks.to_vec(),
        Some(days) => {
            let cutoff = now - Duration::days(days);
            tasks.iter().copied().filter(|t| t.created_at >= cutoff).collect()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCount {
    pub date: NaiveDate,
    pub created: usize,
    pub completed: usize,
}

/// Per-day created/completed counts, oldest day first, ending today. A
/// completed task counts on the day of its last update.
pub fn daily_histogram(tasks: &[&Task], range: TimeRange, now: Timestamp) -> Vec<DailyCount> {
    let today = now.date_naive();
    let days = range.days().unwrap_or_else(|| {
        let earliest = tasks.iter().map(|t| t.created_at.date_naive()).min();
        let span = earliest.map_or(1, |e| (today - e).num_days() + 1);
        span.clamp(1, MAX_HISTOGRAM_DAYS)
    });

    (0..days)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            DailyCount {
                date,
                created: tasks
                    .iter()
                    .filter(|t| t.created_at.date_naive() == date)
                    .count(),
                completed: tasks
                    .iter()
                    .filter(|t| t.completed && t.updated_at.date_naive() == date)
                    .count(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityBreakdown {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl PriorityBreakdown {
    pub fn compute(tasks: &[&Task]) -> Self {
        let mut breakdown = Self::default();
        for task in tasks {
            match task.priority {
                Priority::High => breakdown.high += 1,
                Priority::Medium => breakdown.medium += 1,
                Priority::Low => breakdown.low += 1,
            }
        }
        breakdown
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBreakdown {
    pub completed: usize,
    pub on_time: usize,
    pub overdue: usize,
}

impl StatusBreakdown {
    pub fn compute(tasks: &[&Task], now: Timestamp) -> Self {
        let completed = tasks.iter().filter(|t| t.completed).count();
        let overdue = tasks.iter().filter(|t| is_overdue(t, now)).count();
        Self {
            completed,
            on_time: tasks.len() - completed - overdue,
            overdue,
        }
    }
}

/// Everything the analytics view of one board shows for a time range.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub range: TimeRange,
    pub stats: TaskStats,
    pub daily: Vec<DailyCount>,
    pub priorities: PriorityBreakdown,
    pub statuses: StatusBreakdown,
}

impl Analytics {
    pub fn compute(tasks: &[&Task], range: TimeRange, now: Timestamp) -> Self {
        let scoped = scope_to_range(tasks, range, now);
        Self {
            range,
            stats: TaskStats::compute(&scoped, now),
            daily: daily_histogram(&scoped, range, now),
            priorities: PriorityBreakdown::compute(&scoped),
            statuses: StatusBreakdown::compute(&scoped, now),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardProgress {
    pub board_id: String,
    pub title: String,
    pub completed: usize,
    pub total: usize,
    pub percent: f64,
}

impl BoardProgress {
    pub fn compute(board: &Board, tasks: &[&Task]) -> Self {
        let board_tasks: Vec<&&Task> = tasks.iter().filter(|t| t.board_id == board.id).collect();
        let completed = board_tasks.iter().filter(|t| t.completed).count();
        Self {
            board_id: board.id.clone(),
            title: board.title.clone(),
            completed,
            total: board_tasks.len(),
            percent: percent(completed, board_tasks.len()),
        }
    }
}

/// Cross-board overview for the signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub board_count: usize,
    pub stats: TaskStats,
    /// High priority and not yet completed.
    pub open_high_priority: usize,
    pub boards: Vec<BoardProgress>,
}

impl DashboardSummary {
    pub fn compute(boards: &[&Board], tasks: &[&Task], now: Timestamp) -> Self {
        Self {
            board_count: boards.len(),
            stats: TaskStats::compute(tasks, now),
            open_high_priority: tasks
                .iter()
                .filter(|t| t.priority == Priority::High && !t.completed)
                .count(),
            boards: boards.iter().map(|b| BoardProgress::compute(b, tasks)).collect(),
        }
    }
}

/// Boards whose title or description contains `query`, case-insensitively.
pub fn search_boards<'a>(boards: &'a [Board], query: &str) -> Vec<&'a Board> {
    let needle = query.to_lowercase();
    boards
        .iter()
        .filter(|b| {
            needle.is_empty()
                || b.title.to_lowercase().contains(&needle)
                || b.description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtaskProgress {
    pub completed: usize,
    pub total: usize,
    pub percent: f64,
}

impl SubtaskProgress {
    pub fn compute(subtasks: &[&Subtask]) -> Self {
        let completed = subtasks.iter().filter(|s| s.completed).count();
        Self {
            completed,
            total: subtasks.len(),
            percent: percent(completed, subtasks.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    fn task(id: &str, created_days_ago: i64) -> Task {
        let created = now() - Duration::days(created_days_ago);
        Task {
            id: id.into(),
            title: id.into(),
            description: None,
            column_id: "c1".into(),
            board_id: "b1".into(),
            position: 0,
            priority: Priority::Medium,
            due_date: None,
            completed: false,
            owner_id: "u1".into(),
            created_at: created,
            updated_at: created,
        }
    }

    fn completed(id: &str, created_days_ago: i64, took_days: i64) -> Task {
        let mut t = task(id, created_days_ago);
        t.completed = true;
        t.updated_at = t.created_at + Duration::days(took_days);
        t
    }

    #[test]
    fn test_stats_on_empty_set() {
        let stats = TaskStats::compute(&[], now());
        assert_eq!(stats.total, 0);
        assert_eq!(stats.completion_rate, 0.0);
        assert_eq!(stats.avg_completion_days, 0.0);
    }

    #[test]
    fn test_overdue_task_counts_toward_denominator() {
        let mut late = task("late", 3);
        late.due_date = Some(now() - Duration::days(1));
        let done = completed("done", 4, 2);
        let tasks = vec![&late, &done];

        let stats = TaskStats::compute(&tasks, now());
        assert_eq!(stats.total, 2);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.completion_rate, 50.0);
    }

    #[test]
    fn test_completion_rate_is_not_rounded() {
        let done = completed("done", 4, 2);
        let (a, b) = (task("a", 1), task("b", 2));
        let stats = TaskStats::compute(&[&done, &a, &b], now());
        assert_eq!(stats.completion_rate, 1.0 / 3.0 * 100.0);
        assert_ne!(stats.completion_rate, 33.3);
    }

    #[test]
    fn test_average_completion_days_rounds_to_one_decimal() {
        let a = completed("a", 10, 1);
        let b = completed("b", 10, 2);
        let mut c = completed("c", 10, 0);
        c.updated_at = c.created_at + Duration::hours(8);
        let stats = TaskStats::compute(&[&a, &b, &c], now());
        // (1 + 2 + 1/3) / 3 = 1.111...
        assert_eq!(stats.avg_completion_days, 1.1);
    }

    #[test]
    fn test_due_today_excludes_completed() {
        let mut open = task("open", 1);
        open.due_date = Some(now() + Duration::hours(2));
        let mut done = completed("done", 1, 0);
        done.due_date = Some(now() + Duration::hours(2));
        let mut high = task("high", 1);
        high.priority = Priority::High;
        let stats = TaskStats::compute(&[&open, &done, &high], now());
        assert_eq!(stats.due_today, 1);
        assert_eq!(stats.high_priority, 1);
    }

    #[test]
    fn test_scope_to_range_uses_creation_time() {
        let recent = task("recent", 3);
        let old = task("old", 40);
        let tasks = vec![&recent, &old];
        assert_eq!(scope_to_range(&tasks, TimeRange::Week, now()).len(), 1);
        assert_eq!(scope_to_range(&tasks, TimeRange::Quarter, now()).len(), 2);
        assert_eq!(scope_to_range(&tasks, TimeRange::All, now()).len(), 2);
    }

    #[test]
    fn test_daily_histogram_window() {
        let a = task("a", 0);
        let b = completed("b", 2, 1);
        let hist = daily_histogram(&[&a, &b], TimeRange::Week, now());
        assert_eq!(hist.len(), 7);
        assert_eq!(hist.last().unwrap().date, now().date_naive());
        assert_eq!(hist[6].created, 1);
        assert_eq!(hist[4].created, 1);
        assert_eq!(hist[5].completed, 1);
    }

    #[test]
    fn test_daily_histogram_all_spans_from_earliest_task() {
        let a = task("a", 12);
        let hist = daily_histogram(&[&a], TimeRange::All, now());
        assert_eq!(hist.len(), 13);
        assert_eq!(hist[0].created, 1);

        let ancient = task("ancient", 900);
        assert_eq!(daily_histogram(&[&ancient], TimeRange::All, now()).len(), 365);
        assert_eq!(daily_histogram(&[], TimeRange::All, now()).len(), 1);
    }

    #[test]
    fn test_breakdowns() {
        let mut high = task("h", 1);
        high.priority = Priority::High;
        high.due_date = Some(now() - Duration::hours(1));
        let low = {
            let mut t = task("l", 1);
            t.priority = Priority::Low;
            t
        };
        let done = completed("d", 1, 0);
        let tasks = vec![&high, &low, &done];

        assert_eq!(
            PriorityBreakdown::compute(&tasks),
            PriorityBreakdown {
                high: 1,
                medium: 1,
                low: 1
            }
        );
        assert_eq!(
            StatusBreakdown::compute(&tasks, now()),
            StatusBreakdown {
                completed: 1,
                on_time: 1,
                overdue: 1
            }
        );
    }

    #[test]
    fn test_time_range_parse() {
        assert_eq!("90d".parse::<TimeRange>().unwrap(), TimeRange::Quarter);
        assert!("1y".parse::<TimeRange>().is_err());
        assert_eq!(serde_json::to_string(&TimeRange::Week).unwrap(), "\"7d\"");
    }

    #[test]
    fn test_dashboard_summary_and_board_progress() {
        let board = Board {
            id: "b1".into(),
            title: "Website".into(),
            description: Some("Redesign".into()),
            owner_id: "u1".into(),
            created_at: now(),
            updated_at: now(),
        };
        let mut open_high = task("a", 1);
        open_high.priority = Priority::High;
        let mut done_high = completed("b", 1, 0);
        done_high.priority = Priority::High;
        let tasks = vec![&open_high, &done_high];

        let summary = DashboardSummary::compute(&[&board], &tasks, now());
        assert_eq!(summary.board_count, 1);
        assert_eq!(summary.stats.high_priority, 2);
        assert_eq!(summary.open_high_priority, 1);
        assert_eq!(summary.boards[0].percent, 50.0);

        let boards = vec![board];
        assert_eq!(search_boards(&boards, "REDESIGN").len(), 1);
        assert!(search_boards(&boards, "mobile").is_empty());
        assert_eq!(search_boards(&boards, "").len(), 1);
        // The query is matched as typed, surrounding spaces included.
        assert!(search_boards(&boards, " website").is_empty());
    }

    #[test]
    fn test_subtask_progress() {
        assert_eq!(SubtaskProgress::compute(&[]).percent, 0.0);
        let mk = |done: bool| Subtask {
            id: "s".into(),
            title: "s".into(),
            task_id: "t".into(),
            completed: done,
            position: 0,
            owner_id: "u1".into(),
            created_at: now(),
            updated_at: now(),
        };
        let (a, b, c) = (mk(true), mk(false), mk(false));
        let progress = SubtaskProgress::compute(&[&a, &b, &c]);
        assert_eq!(progress.completed, 1);
        assert_eq!(progress.total, 3);
        assert!((progress.percent - 100.0 / 3.0).abs() < 1e-9);
    }
}
