//! Default columns and the demonstration data set.

use chrono::Duration;

use super::models::{Board, Column, Priority, Subtask, Task, Timestamp, new_id};
use super::store::EntityStore;

pub const DEFAULT_COLUMN_TITLES: [&str; 4] = ["To Do", "In Progress", "Review", "Done"];

/// The four workflow columns every board starts with, at positions 0..3.
pub fn default_columns(board_id: &str, owner_id: &str, now: Timestamp) -> Vec<Column> {
    DEFAULT_COLUMN_TITLES
        .iter()
        .enumerate()
        .map(|(pos, title)| Column {
            id: new_id("col"),
            title: title.to_string(),
            board_id: board_id.to_string(),
            position: pos as i64,
            owner_id: owner_id.to_string(),
            created_at: now,
            updated_at: now,
        })
        .collect()
}

struct TaskSeed {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    column_id: &'static str,
    board_id: &'static str,
    position: i64,
    priority: Priority,
    due_in_days: Option<i64>,
    completed: bool,
}

const BOARDS: [(&str, &str, &str, i64); 3] = [
    (
        "board-1",
        "Website Redesign Project",
        "Complete overhaul of company website with modern design and improved UX",
        7,
    ),
    (
        "board-2",
        "Mobile App Development",
        "Build cross-platform iOS and Android applications",
        14,
    ),
    (
        "board-3",
        "Marketing Campaign Q1",
        "Plan and execute marketing campaigns for the first quarter",
        3,
    ),
];

const TASKS: [TaskSeed; 7] = [
    TaskSeed {
        id: "task-1",
        title: "Design new homepage layout",
        description: "Create wireframes and mockups for the new homepage design with modern UI/UX principles",
        column_id: "col-1",
        board_id: "board-1",
        position: 0,
        priority: Priority::High,
        due_in_days: Some(7),
        completed: false,
    },
    TaskSeed {
        id: "task-2",
        title: "Set up development environment",
        description: "Configure local development setup with all necessary tools and dependencies",
        column_id: "col-2",
        board_id: "board-1",
        position: 0,
        priority: Priority::Medium,
        due_in_days: None,
        completed: false,
    },
    TaskSeed {
        id: "task-3",
        title: "Research competitor analysis",
        description: "Analyze competitor websites and document findings for strategic insights",
        column_id: "col-4",
        board_id: "board-1",
        position: 0,
        priority: Priority::Low,
        due_in_days: None,
        completed: true,
    },
    TaskSeed {
        id: "task-4",
        title: "Implement responsive navigation",
        description: "Build mobile-first navigation component with smooth animations",
        column_id: "col-2",
        board_id: "board-1",
        position: 1,
        priority: Priority::High,
        due_in_days: Some(3),
        completed: false,
    },
    TaskSeed {
        id: "task-5",
        title: "Content strategy planning",
        description: "Plan content structure and create content calendar for the website",
        column_id: "col-3",
        board_id: "board-1",
        position: 0,
        priority: Priority::Medium,
        due_in_days: None,
        completed: false,
    },
    TaskSeed {
        id: "task-6",
        title: "Build mobile app UI",
        description: "Create mobile app interface",
        column_id: "col-5",
        board_id: "board-2",
        position: 0,
        priority: Priority::High,
        due_in_days: Some(5),
        completed: false,
    },
    TaskSeed {
        id: "task-7",
        title: "Plan social media strategy",
        description: "Create social media content plan",
        column_id: "col-9",
        board_id: "board-3",
        position: 0,
        priority: Priority::Medium,
        due_in_days: Some(1),
        completed: false,
    },
];

const SUBTASKS: [(&str, &str, &str, bool, i64); 4] = [
    ("subtask-1", "Create wireframes", "task-1", true, 0),
    ("subtask-2", "Design mockups", "task-1", false, 1),
    ("subtask-3", "Install Node.js", "task-2", true, 0),
    ("subtask-4", "Configure VS Code", "task-2", true, 1),
];

/// Fixed demonstration boards used when the record store has nothing for the
/// user. Ids are stable (`board-1`, `col-1` .. `col-12`, `task-1` ..) so the
/// data set is predictable across runs.
pub fn demo_dataset(owner_id: &str, now: Timestamp) -> EntityStore {
    let boards = BOARDS
        .iter()
        .map(|(id, title, description, age_days)| Board {
            id: id.to_string(),
            title: title.to_string(),
            description: Some(description.to_string()),
            owner_id: owner_id.to_string(),
            created_at: now - Duration::days(*age_days),
            updated_at: now - Duration::hours(1),
        })
        .collect::<Vec<_>>();

    let columns = boards
        .iter()
        .enumerate()
        .flat_map(|(b, board)| {
            DEFAULT_COLUMN_TITLES
                .iter()
                .enumerate()
                .map(move |(pos, title)| Column {
                    id: format!("col-{}", b * 4 + pos + 1),
                    title: title.to_string(),
                    board_id: board.id.clone(),
                    position: pos as i64,
                    owner_id: owner_id.to_string(),
                    created_at: board.created_at,
                    updated_at: board.created_at,
                })
        })
        .collect::<Vec<_>>();

    let tasks = TASKS
        .iter()
        .map(|seed| Task {
            id: seed.id.to_string(),
            title: seed.title.to_string(),
            description: Some(seed.description.to_string()),
            column_id: seed.column_id.to_string(),
            board_id: seed.board_id.to_string(),
            position: seed.position,
            priority: seed.priority,
            due_date: seed.due_in_days.map(|d| now + Duration::days(d)),
            completed: seed.completed,
            owner_id: owner_id.to_string(),
            created_at: now,
            updated_at: now,
        })
        .collect();

    let subtasks = SUBTASKS
        .iter()
        .map(|(id, title, task_id, completed, position)| Subtask {
            id: id.to_string(),
            title: title.to_string(),
            task_id: task_id.to_string(),
            completed: *completed,
            position: *position,
            owner_id: owner_id.to_string(),
            created_at: now,
            updated_at: now,
        })
        .collect();

    EntityStore::new(boards, columns, tasks, subtasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_default_columns_positions_and_titles() {
        let cols = default_columns("b1", "u1", Utc::now());
        let titles: Vec<_> = cols.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["To Do", "In Progress", "Review", "Done"]);
        let positions: Vec<_> = cols.iter().map(|c| c.position).collect();
        assert_eq!(positions, vec![0, 1, 2, 3]);
        assert!(cols.iter().all(|c| c.board_id == "b1" && c.id.starts_with("col-")));
        assert_ne!(cols[0].id, cols[1].id);
    }

    #[test]
    fn test_demo_dataset_is_consistent() {
        let store = demo_dataset("user-1", Utc::now());
        assert_eq!(store.boards().len(), 3);
        assert_eq!(store.columns().len(), 12);
        assert_eq!(store.tasks().len(), 7);
        assert_eq!(store.subtasks().len(), 4);

        for task in store.tasks() {
            let column = store.column(&task.column_id).expect("task column exists");
            assert_eq!(column.board_id, task.board_id, "{}", task.id);
        }
        for subtask in store.subtasks() {
            assert!(store.task(&subtask.task_id).is_some());
        }
        assert!(store.boards().iter().all(|b| b.owner_id == "user-1"));
        assert_eq!(store.columns_of("board-2")[0].id, "col-5");
    }
}
