//! Task activity: change classification, message rendering and day grouping.

use chrono::{DateTime, Duration, NaiveDate, SecondsFormat};
use serde::Serialize;

use super::identity::Identity;
use super::models::{
    ActivityDetails, ActivityEntry, ActivityKind, Column, Task, TaskPatch, Timestamp, new_id,
};

const UNKNOWN_COLUMN: &str = "Unknown";

/// Classify a task update by comparing the record before the update with the
/// patch. The first matching rule wins: move, completion, priority, due date,
/// then plain update.
pub fn classify(prior: &Task, patch: &TaskPatch, columns: &[Column]) -> (ActivityKind, ActivityDetails) {
    if let Some(column_id) = patch.column_id.as_deref().filter(|c| *c != prior.column_id) {
        let title_of = |id: &str| {
            columns
                .iter()
                .find(|c| c.id == id)
                .map(|c| c.title.clone())
                .unwrap_or_else(|| UNKNOWN_COLUMN.to_string())
        };
        let details = ActivityDetails {
            from: Some(title_of(&prior.column_id)),
            to: Some(title_of(column_id)),
            ..ActivityDetails::default()
        };
        return (ActivityKind::Moved, details);
    }

    if patch.completed.is_some_and(|c| c != prior.completed) {
        return (ActivityKind::Completed, ActivityDetails::default());
    }

    if let Some(priority) = patch.priority.filter(|p| *p != prior.priority) {
        let details = ActivityDetails {
            old_value: Some(prior.priority.to_string()),
            new_value: Some(priority.to_string()),
            ..ActivityDetails::default()
        };
        return (ActivityKind::PriorityChanged, details);
    }

    if let Some(due_date) = patch.due_date.filter(|d| *d != prior.due_date) {
        let details = ActivityDetails {
            old_value: prior.due_date.map(format_instant),
            new_value: due_date.map(format_instant),
            ..ActivityDetails::default()
        };
        return (ActivityKind::DueDateChanged, details);
    }

    (ActivityKind::Updated, ActivityDetails::default())
}

/// Build an entry for `task` as it looked when the event happened.
pub fn entry(
    kind: ActivityKind,
    task: &Task,
    actor: &Identity,
    details: ActivityDetails,
    now: Timestamp,
) -> ActivityEntry {
    ActivityEntry {
        id: new_id("activity"),
        kind,
        task_title: task.title.clone(),
        task_id: task.id.clone(),
        actor_id: actor.id.clone(),
        actor_name: actor.actor_name(),
        timestamp: now,
        details,
    }
}

fn format_instant(ts: Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn display_date(value: &str) -> String {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|_| value.to_string())
}

/// One-line human readable description, e.g. `moved "Fix login" from To Do to Done`.
pub fn describe(entry: &ActivityEntry) -> String {
    let title = &entry.task_title;
    let details = &entry.details;
    let or_unknown = |v: &Option<String>| v.clone().unwrap_or_else(|| UNKNOWN_COLUMN.to_string());
    match entry.kind {
        ActivityKind::Created => format!("created task \"{}\"", title),
        ActivityKind::Updated => format!("updated task \"{}\"", title),
        ActivityKind::Deleted => format!("deleted task \"{}\"", title),
        ActivityKind::Moved => format!(
            "moved \"{}\" from {} to {}",
            title,
            or_unknown(&details.from),
            or_unknown(&details.to)
        ),
        ActivityKind::Completed => format!("completed task \"{}\"", title),
        ActivityKind::PriorityChanged => format!(
            "changed priority of \"{}\" from {} to {}",
            title,
            details.old_value.as_deref().unwrap_or_default(),
            details.new_value.as_deref().unwrap_or_default()
        ),
        ActivityKind::DueDateChanged => match &details.new_value {
            Some(due) => format!("set due date for \"{}\" to {}", title, display_date(due)),
            None => format!("removed due date from \"{}\"", title),
        },
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}

/// Relative label: "just now", "N minutes ago", ... and the plain date after
/// a week.
pub fn time_ago(ts: Timestamp, now: Timestamp) -> String {
    let secs = (now - ts).num_seconds();
    if secs < 60 {
        "just now".to_string()
    } else if secs < 3_600 {
        plural(secs / 60, "minute")
    } else if secs < 86_400 {
        plural(secs / 3_600, "hour")
    } else if secs < 604_800 {
        plural(secs / 86_400, "day")
    } else {
        ts.format("%b %-d, %Y").to_string()
    }
}

/// "Today", "Yesterday", otherwise e.g. "Monday, March 10, 2025".
pub fn day_header(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        "Today".to_string()
    } else if today - Duration::days(1) == date {
        "Yesterday".to_string()
    } else {
        date.format("%A, %B %-d, %Y").to_string()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDay {
    pub date: NaiveDate,
    pub header: String,
    pub entries: Vec<ActivityEntry>,
}

/// Group entries by UTC calendar day. Days and the entries inside each day
/// come newest first.
pub fn group_by_day(entries: &[ActivityEntry], now: Timestamp) -> Vec<ActivityDay> {
    let mut sorted: Vec<&ActivityEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let today = now.date_naive();
    let mut days: Vec<ActivityDay> = Vec::new();
    for entry in sorted {
        let date = entry.timestamp.date_naive();
        match days.last_mut() {
            Some(day) if day.date == date => day.entries.push(entry.clone()),
            _ => days.push(ActivityDay {
                date,
                header: day_header(date, today),
                entries: vec![entry.clone()],
            }),
        }
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::models::Priority;
    use chrono::{TimeZone, Utc};

    fn ts(d: u32, h: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2025, 3, d, h, 0, 0).unwrap()
    }

    fn col(id: &str, title: &str) -> Column {
        Column {
            id: id.into(),
            title: title.into(),
            board_id: "b1".into(),
            position: 0,
            owner_id: "u1".into(),
            created_at: ts(1, 0),
            updated_at: ts(1, 0),
        }
    }

    fn task() -> Task {
        Task {
            id: "t1".into(),
            title: "Fix login".into(),
            description: None,
            column_id: "c1".into(),
            board_id: "b1".into(),
            position: 0,
            priority: Priority::Medium,
            due_date: None,
            completed: false,
            owner_id: "u1".into(),
            created_at: ts(1, 0),
            updated_at: ts(1, 0),
        }
    }

    fn columns() -> Vec<Column> {
        vec![col("c1", "To Do"), col("c2", "Done")]
    }

    fn sample_entry(kind: ActivityKind, at: Timestamp, details: ActivityDetails) -> ActivityEntry {
        ActivityEntry {
            id: "a".into(),
            kind,
            task_title: "Fix login".into(),
            task_id: "t1".into(),
            actor_id: "u1".into(),
            actor_name: "ada".into(),
            timestamp: at,
            details,
        }
    }

    #[test]
    fn test_classify_move_uses_column_titles() {
        let (kind, details) = classify(&task(), &TaskPatch::move_to("c2"), &columns());
        assert_eq!(kind, ActivityKind::Moved);
        assert_eq!(details.from.as_deref(), Some("To Do"));
        assert_eq!(details.to.as_deref(), Some("Done"));
    }

    #[test]
    fn test_classify_move_to_unknown_column() {
        let (_, details) = classify(&task(), &TaskPatch::move_to("gone"), &columns());
        assert_eq!(details.to.as_deref(), Some("Unknown"));
    }

    #[test]
    fn test_classify_same_column_is_not_a_move() {
        let (kind, _) = classify(&task(), &TaskPatch::move_to("c1"), &columns());
        assert_eq!(kind, ActivityKind::Updated);
    }

    #[test]
    fn test_classify_completion_beats_priority() {
        let patch = TaskPatch {
            completed: Some(true),
            priority: Some(Priority::High),
            ..TaskPatch::default()
        };
        let (kind, _) = classify(&task(), &patch, &columns());
        assert_eq!(kind, ActivityKind::Completed);
    }

    #[test]
    fn test_classify_priority_change_records_values() {
        let patch = TaskPatch {
            priority: Some(Priority::High),
            ..TaskPatch::default()
        };
        let (kind, details) = classify(&task(), &patch, &columns());
        assert_eq!(kind, ActivityKind::PriorityChanged);
        assert_eq!(details.old_value.as_deref(), Some("medium"));
        assert_eq!(details.new_value.as_deref(), Some("high"));
    }

    #[test]
    fn test_classify_due_date_set_and_removed() {
        let set = TaskPatch {
            due_date: Some(Some(ts(12, 0))),
            ..TaskPatch::default()
        };
        let (kind, details) = classify(&task(), &set, &columns());
        assert_eq!(kind, ActivityKind::DueDateChanged);
        assert_eq!(details.old_value, None);
        assert!(details.new_value.unwrap().starts_with("2025-03-12"));

        let mut prior = task();
        prior.due_date = Some(ts(12, 0));
        let cleared = TaskPatch {
            due_date: Some(None),
            ..TaskPatch::default()
        };
        let (kind, details) = classify(&prior, &cleared, &columns());
        assert_eq!(kind, ActivityKind::DueDateChanged);
        assert_eq!(details.new_value, None);
    }

    #[test]
    fn test_classify_absent_due_date_is_plain_update() {
        let mut prior = task();
        prior.due_date = Some(ts(12, 0));
        let patch = TaskPatch {
            title: Some("Fix login page".into()),
            ..TaskPatch::default()
        };
        let (kind, _) = classify(&prior, &patch, &columns());
        assert_eq!(kind, ActivityKind::Updated);
    }

    #[test]
    fn test_describe_messages() {
        let moved = sample_entry(
            ActivityKind::Moved,
            ts(1, 0),
            ActivityDetails {
                from: Some("To Do".into()),
                to: Some("Done".into()),
                ..ActivityDetails::default()
            },
        );
        assert_eq!(describe(&moved), "moved \"Fix login\" from To Do to Done");

        let due = sample_entry(
            ActivityKind::DueDateChanged,
            ts(1, 0),
            ActivityDetails {
                new_value: Some("2025-03-12T00:00:00.000Z".into()),
                ..ActivityDetails::default()
            },
        );
        assert_eq!(describe(&due), "set due date for \"Fix login\" to Mar 12, 2025");

        let removed = sample_entry(ActivityKind::DueDateChanged, ts(1, 0), ActivityDetails::default());
        assert_eq!(describe(&removed), "removed due date from \"Fix login\"");
    }

    #[test]
    fn test_time_ago_labels() {
        let now = ts(10, 12);
        assert_eq!(time_ago(now - Duration::seconds(30), now), "just now");
        assert_eq!(time_ago(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(time_ago(now - Duration::minutes(5), now), "5 minutes ago");
        assert_eq!(time_ago(now - Duration::hours(3), now), "3 hours ago");
        assert_eq!(time_ago(now - Duration::days(1), now), "1 day ago");
        assert_eq!(time_ago(ts(1, 12), now), "Mar 1, 2025");
    }

    #[test]
    fn test_day_headers() {
        let today = ts(10, 0).date_naive();
        assert_eq!(day_header(today, today), "Today");
        assert_eq!(day_header(ts(9, 0).date_naive(), today), "Yesterday");
        assert_eq!(day_header(ts(3, 0).date_naive(), today), "Monday, March 3, 2025");
    }

    #[test]
    fn test_group_by_day_newest_first() {
        let entries = vec![
            sample_entry(ActivityKind::Created, ts(9, 8), ActivityDetails::default()),
            sample_entry(ActivityKind::Updated, ts(10, 9), ActivityDetails::default()),
            sample_entry(ActivityKind::Completed, ts(10, 11), ActivityDetails::default()),
        ];
        let days = group_by_day(&entries, ts(10, 12));
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].header, "Today");
        assert_eq!(days[0].entries[0].kind, ActivityKind::Completed);
        assert_eq!(days[0].entries[1].kind, ActivityKind::Updated);
        assert_eq!(days[1].header, "Yesterday");
    }
}
