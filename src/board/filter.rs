//! Task filtering: search, priority, status, due-date range and column.
//!
//! Every predicate is a pure function of the task and `now`. Active filters
//! are ANDed together; within the status set a task passes if it matches ANY
//! selected status.

use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::models::{Priority, Task, Timestamp};
use crate::errors::BoardError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    Completed,
    Overdue,
    Pending,
}

impl StatusFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Overdue => "overdue",
            Self::Pending => "pending",
        }
    }

    pub fn matches(&self, task: &Task, now: Timestamp) -> bool {
        match self {
            Self::Completed => task.completed,
            Self::Overdue => is_overdue(task, now),
            Self::Pending => !task.completed && task.due_date.is_none_or(|d| d >= now),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(Self::Completed),
            "overdue" => Ok(Self::Overdue),
            "pending" => Ok(Self::Pending),
            _ => Err(format!("Invalid status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueDateRange {
    #[default]
    All,
    Today,
    Week,
    Overdue,
}

impl DueDateRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Today => "today",
            Self::Week => "week",
            Self::Overdue => "overdue",
        }
    }

    /// Tasks without a due date only pass `All`.
    pub fn matches(&self, task: &Task, now: Timestamp) -> bool {
        let Some(due) = task.due_date else {
            return *self == Self::All;
        };
        match self {
            Self::All => true,
            Self::Today => due.date_naive() == now.date_naive(),
            Self::Week => due >= now && due <= now + Duration::days(7),
            Self::Overdue => is_overdue(task, now),
        }
    }
}

impl FromStr for DueDateRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "today" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            "overdue" => Ok(Self::Overdue),
            _ => Err(format!("Invalid due date range: {}", s)),
        }
    }
}

/// Past due and not completed.
pub fn is_overdue(task: &Task, now: Timestamp) -> bool {
    !task.completed && task.due_date.is_some_and(|d| d < now)
}

/// Due on the same UTC calendar day as `now`, regardless of completion.
pub fn is_due_today(task: &Task, now: Timestamp) -> bool {
    task.due_date
        .is_some_and(|d| d.date_naive() == now.date_naive())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilters {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub priorities: Vec<Priority>,
    #[serde(default)]
    pub statuses: Vec<StatusFilter>,
    #[serde(default)]
    pub due_date_range: DueDateRange,
    #[serde(default)]
    pub columns: Vec<String>,
}

/// Flat, comma-separated form of `TaskFilters` as it arrives in a query
/// string, e.g. `?priority=high,low&status=overdue&due=week`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterParams {
    pub search: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub due: Option<String>,
    pub column: Option<String>,
}

fn split_list(raw: Option<&str>) -> impl Iterator<Item = &str> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

impl TaskFilters {
    pub fn parse(params: &FilterParams) -> Result<Self, BoardError> {
        let priorities = split_list(params.priority.as_deref())
            .map(|p| p.parse::<Priority>().map_err(|_| BoardError::InvalidPriority(p.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        let statuses = split_list(params.status.as_deref())
            .map(|s| s.parse::<StatusFilter>().map_err(BoardError::InvalidFilter))
            .collect::<Result<Vec<_>, _>>()?;
        let due_date_range = match params.due.as_deref().map(str::trim) {
            None | Some("") => DueDateRange::All,
            Some(raw) => raw.parse().map_err(BoardError::InvalidFilter)?,
        };
        Ok(Self {
            search: params.search.clone().unwrap_or_default(),
            priorities,
            statuses,
            due_date_range,
            columns: split_list(params.column.as_deref()).map(str::to_string).collect(),
        })
    }

    /// Number of active non-search filters.
    pub fn active_count(&self) -> usize {
        self.priorities.len()
            + self.statuses.len()
            + usize::from(self.due_date_range != DueDateRange::All)
            + self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_empty() && self.active_count() == 0
    }

    fn matches_search(&self, task: &Task) -> bool {
        let needle = self.search.to_lowercase();
        if needle.is_empty() {
            return true;
        }
        task.title.to_lowercase().contains(&needle)
            || task
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
    }

    pub fn matches(&self, task: &Task, now: Timestamp) -> bool {
        self.matches_search(task)
            && (self.priorities.is_empty() || self.priorities.contains(&task.priority))
            && (self.statuses.is_empty() || self.statuses.iter().any(|s| s.matches(task, now)))
            && self.due_date_range.matches(task, now)
            && (self.columns.is_empty() || self.columns.contains(&task.column_id))
    }

    pub fn apply<'a>(&self, tasks: &[&'a Task], now: Timestamp) -> Vec<&'a Task> {
        tasks
            .iter()
            .copied()
            .filter(|t| self.matches(t, now))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    fn task(id: &str) -> Task {
        Task {
            id: id.into(),
            title: format!("Task {}", id),
            description: None,
            column_id: "c1".into(),
            board_id: "b1".into(),
            position: 0,
            priority: Priority::Medium,
            due_date: None,
            completed: false,
            owner_id: "u1".into(),
            created_at: now(),
            updated_at: now(),
        }
    }

    fn due(id: &str, offset_hours: i64) -> Task {
        let mut t = task(id);
        t.due_date = Some(now() + Duration::hours(offset_hours));
        t
    }

    fn ids(tasks: Vec<&Task>) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_completed_task_is_never_overdue() {
        let mut t = due("t1", -24);
        assert!(is_overdue(&t, now()));
        t.completed = true;
        assert!(!is_overdue(&t, now()));
        assert!(!DueDateRange::Overdue.matches(&t, now()));
        assert!(!StatusFilter::Overdue.matches(&t, now()));
    }

    #[test]
    fn test_status_filters_match_any() {
        let overdue = due("late", -24);
        let mut done = task("done");
        done.completed = true;
        let open = due("open", 24);
        let tasks = vec![&overdue, &done, &open];

        let filters = TaskFilters {
            statuses: vec![StatusFilter::Completed, StatusFilter::Overdue],
            ..TaskFilters::default()
        };
        assert_eq!(ids(filters.apply(&tasks, now())), vec!["late", "done"]);

        let pending = TaskFilters {
            statuses: vec![StatusFilter::Pending],
            ..TaskFilters::default()
        };
        assert_eq!(ids(pending.apply(&tasks, now())), vec!["open"]);
    }

    #[test]
    fn test_due_ranges_exclude_undated_tasks() {
        let undated = task("none");
        let today = due("today", 2);
        let in_five_days = due("soon", 24 * 5);
        let in_ten_days = due("later", 24 * 10);
        let tasks = vec![&undated, &today, &in_five_days, &in_ten_days];

        let range = |r| TaskFilters {
            due_date_range: r,
            ..TaskFilters::default()
        };
        assert_eq!(range(DueDateRange::All).apply(&tasks, now()).len(), 4);
        assert_eq!(ids(range(DueDateRange::Today).apply(&tasks, now())), vec!["today"]);
        assert_eq!(
            ids(range(DueDateRange::Week).apply(&tasks, now())),
            vec!["today", "soon"]
        );
        assert!(range(DueDateRange::Overdue).apply(&tasks, now()).is_empty());
    }

    #[test]
    fn test_search_is_case_insensitive_over_title_and_description() {
        let mut a = task("a");
        a.title = "Design Homepage".into();
        let mut b = task("b");
        b.description = Some("update the HOMEPAGE copy".into());
        let c = task("c");
        let tasks = vec![&a, &b, &c];
        let filters = TaskFilters {
            search: "homepage".into(),
            ..TaskFilters::default()
        };
        assert_eq!(ids(filters.apply(&tasks, now())), vec!["a", "b"]);
    }

    #[test]
    fn test_search_keeps_surrounding_whitespace() {
        let mut a = task("a");
        a.title = "Fix login-page redirect".into();
        let mut b = task("b");
        b.title = "Add login form".into();
        let tasks = vec![&a, &b];
        let filters = TaskFilters {
            search: "login ".into(),
            ..TaskFilters::default()
        };
        assert_eq!(ids(filters.apply(&tasks, now())), vec!["b"]);
        assert!(!filters.is_empty());
    }

    #[test]
    fn test_filters_and_together() {
        let mut a = task("a");
        a.priority = Priority::High;
        a.column_id = "c2".into();
        let mut b = task("b");
        b.priority = Priority::High;
        let tasks = vec![&a, &b];
        let filters = TaskFilters {
            priorities: vec![Priority::High],
            columns: vec!["c2".into()],
            ..TaskFilters::default()
        };
        assert_eq!(ids(filters.apply(&tasks, now())), vec!["a"]);
        assert_eq!(filters.active_count(), 2);
    }

    #[test]
    fn test_empty_filters_keep_everything() {
        let a = task("a");
        let b = due("b", -5);
        let filters = TaskFilters::default();
        assert!(filters.is_empty());
        assert_eq!(filters.apply(&[&a, &b], now()).len(), 2);
    }

    #[test]
    fn test_parse_params() {
        let params = FilterParams {
            search: Some("login".into()),
            priority: Some("high, low".into()),
            status: Some("overdue".into()),
            due: Some("week".into()),
            column: Some("c1,c2".into()),
        };
        let filters = TaskFilters::parse(&params).unwrap();
        assert_eq!(filters.priorities, vec![Priority::High, Priority::Low]);
        assert_eq!(filters.statuses, vec![StatusFilter::Overdue]);
        assert_eq!(filters.due_date_range, DueDateRange::Week);
        assert_eq!(filters.active_count(), 2 + 1 + 1 + 2);
    }

    #[test]
    fn test_parse_rejects_unknown_values() {
        let bad_priority = FilterParams {
            priority: Some("urgent".into()),
            ..FilterParams::default()
        };
        assert!(matches!(
            TaskFilters::parse(&bad_priority),
            Err(BoardError::InvalidPriority(p)) if p == "urgent"
        ));

        let bad_due = FilterParams {
            due: Some("month".into()),
            ..FilterParams::default()
        };
        assert!(matches!(
            TaskFilters::parse(&bad_due),
            Err(BoardError::InvalidFilter(_))
        ));
    }
}
