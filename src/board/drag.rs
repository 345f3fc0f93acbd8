//! Drag-and-drop reassignment.
//!
//! A drop target is either a task (drop onto a card) or a column (drop onto
//! empty column space). Either way the result is a column id.

use super::models::{Task, TaskPatch};

/// Column a drop onto `target_id` lands in.
pub fn resolve_drop_column<'a>(tasks: &'a [Task], target_id: &'a str) -> &'a str {
    tasks
        .iter()
        .find(|t| t.id == target_id)
        .map(|t| t.column_id.as_str())
        .unwrap_or(target_id)
}

/// Patch for dropping `dragged` onto `target_id`, or `None` when the task
/// already sits in that column.
pub fn plan_drop(tasks: &[Task], dragged: &Task, target_id: &str) -> Option<TaskPatch> {
    let column_id = resolve_drop_column(tasks, target_id);
    (column_id != dragged.column_id).then(|| TaskPatch::move_to(column_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::models::Priority;
    use chrono::Utc;

    fn task(id: &str, column: &str) -> Task {
        Task {
            id: id.into(),
            title: id.into(),
            description: None,
            column_id: column.into(),
            board_id: "b1".into(),
            position: 0,
            priority: Priority::Medium,
            due_date: None,
            completed: false,
            owner_id: "u1".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_drop_on_task_uses_its_column() {
        let tasks = vec![task("t1", "c1"), task("t2", "c2")];
        assert_eq!(resolve_drop_column(&tasks, "t2"), "c2");
        assert_eq!(resolve_drop_column(&tasks, "c3"), "c3");
    }

    #[test]
    fn test_drop_in_same_column_is_a_no_op() {
        let tasks = vec![task("t1", "c1"), task("t2", "c1")];
        assert!(plan_drop(&tasks, &tasks[0], "t2").is_none());
        assert!(plan_drop(&tasks, &tasks[0], "c1").is_none());
    }

    #[test]
    fn test_drop_on_other_column_moves_only_column() {
        let tasks = vec![task("t1", "c1"), task("t2", "c2")];
        let patch = plan_drop(&tasks, &tasks[0], "t2").unwrap();
        assert_eq!(patch, TaskPatch::move_to("c2"));
        assert_eq!(patch.position, None);
    }
}
