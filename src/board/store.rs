//! Session-local entity collections.
//!
//! The store is the authoritative copy of the signed-in user's data. Readers
//! get slices or position-sorted views; writes go through the `pub(crate)`
//! mutators used by `KanbanService`.

use super::models::{ActivityEntry, Board, Column, Subtask, Task};

#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    boards: Vec<Board>,
    columns: Vec<Column>,
    tasks: Vec<Task>,
    subtasks: Vec<Subtask>,
    activity: Vec<ActivityEntry>,
}

/// Everything taken out of the store by one cascading delete.
#[derive(Debug, Clone, Default)]
pub struct Removed {
    pub boards: Vec<Board>,
    pub columns: Vec<Column>,
    pub tasks: Vec<Task>,
    pub subtasks: Vec<Subtask>,
}

impl Removed {
    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
            && self.columns.is_empty()
            && self.tasks.is_empty()
            && self.subtasks.is_empty()
    }

    pub fn subtask_ids(&self) -> Vec<String> {
        self.subtasks.iter().map(|s| s.id.clone()).collect()
    }

    pub fn task_ids(&self) -> Vec<String> {
        self.tasks.iter().map(|t| t.id.clone()).collect()
    }

    pub fn column_ids(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.id.clone()).collect()
    }
}

impl EntityStore {
    pub fn new(
        boards: Vec<Board>,
        columns: Vec<Column>,
        tasks: Vec<Task>,
        subtasks: Vec<Subtask>,
    ) -> Self {
        Self {
            boards,
            columns,
            tasks,
            subtasks,
            activity: Vec::new(),
        }
    }

    pub fn boards(&self) -> &[Board] {
        &self.boards
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn subtasks(&self) -> &[Subtask] {
        &self.subtasks
    }

    /// Newest first.
    pub fn activity(&self) -> &[ActivityEntry] {
        &self.activity
    }

    pub fn board(&self, id: &str) -> Option<&Board> {
        self.boards.iter().find(|b| b.id == id)
    }

    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn subtask(&self, id: &str) -> Option<&Subtask> {
        self.subtasks.iter().find(|s| s.id == id)
    }

    /// Columns of a board ordered by `position`. Ties keep insertion order.
    pub fn columns_of(&self, board_id: &str) -> Vec<&Column> {
        let mut columns: Vec<&Column> = self
            .columns
            .iter()
            .filter(|c| c.board_id == board_id)
            .collect();
        columns.sort_by_key(|c| c.position);
        columns
    }

    pub fn tasks_of_board(&self, board_id: &str) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.board_id == board_id).collect()
    }

    /// Tasks in one column ordered by `position`.
    pub fn tasks_in_column(&self, column_id: &str) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| t.column_id == column_id)
            .collect();
        tasks.sort_by_key(|t| t.position);
        tasks
    }

    pub fn subtasks_of(&self, task_id: &str) -> Vec<&Subtask> {
        let mut subtasks: Vec<&Subtask> = self
            .subtasks
            .iter()
            .filter(|s| s.task_id == task_id)
            .collect();
        subtasks.sort_by_key(|s| s.position);
        subtasks
    }

    pub fn all_tasks(&self) -> Vec<&Task> {
        self.tasks.iter().collect()
    }

    // ── Mutators ──────────────────────────────────────────────────────

    pub(crate) fn insert_board(&mut self, board: Board) {
        self.boards.push(board);
    }

    pub(crate) fn insert_column(&mut self, column: Column) {
        self.columns.push(column);
    }

    pub(crate) fn insert_task(&mut self, task: Task) {
        self.tasks.push(task);
    }

    pub(crate) fn insert_subtask(&mut self, subtask: Subtask) {
        self.subtasks.push(subtask);
    }

    pub(crate) fn board_mut(&mut self, id: &str) -> Option<&mut Board> {
        self.boards.iter_mut().find(|b| b.id == id)
    }

    pub(crate) fn column_mut(&mut self, id: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.id == id)
    }

    pub(crate) fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub(crate) fn subtask_mut(&mut self, id: &str) -> Option<&mut Subtask> {
        self.subtasks.iter_mut().find(|s| s.id == id)
    }

    /// Prepend an activity entry so the log stays newest-first.
    pub(crate) fn record(&mut self, entry: ActivityEntry) {
        self.activity.insert(0, entry);
    }

    pub(crate) fn remove_subtask(&mut self, id: &str) -> Option<Subtask> {
        let idx = self.subtasks.iter().position(|s| s.id == id)?;
        Some(self.subtasks.remove(idx))
    }

    /// Remove a task together with its subtasks.
    pub(crate) fn remove_task(&mut self, id: &str) -> Removed {
        let mut removed = Removed::default();
        if let Some(idx) = self.tasks.iter().position(|t| t.id == id) {
            removed.tasks.push(self.tasks.remove(idx));
            removed.subtasks = drain_where(&mut self.subtasks, |s| s.task_id == id);
        }
        removed
    }

    /// Remove a column, the tasks in it, and their subtasks.
    pub(crate) fn remove_column(&mut self, id: &str) -> Removed {
        let mut removed = Removed::default();
        let Some(idx) = self.columns.iter().position(|c| c.id == id) else {
            return removed;
        };
        removed.columns.push(self.columns.remove(idx));
        removed.tasks = drain_where(&mut self.tasks, |t| t.column_id == id);
        let task_ids: Vec<&str> = removed.tasks.iter().map(|t| t.id.as_str()).collect();
        removed.subtasks = drain_where(&mut self.subtasks, |s| task_ids.contains(&s.task_id.as_str()));
        removed
    }

    /// Remove a board and everything under it.
    pub(crate) fn remove_board(&mut self, id: &str) -> Removed {
        let mut removed = Removed::default();
        let Some(idx) = self.boards.iter().position(|b| b.id == id) else {
            return removed;
        };
        removed.boards.push(self.boards.remove(idx));
        removed.columns = drain_where(&mut self.columns, |c| c.board_id == id);
        removed.tasks = drain_where(&mut self.tasks, |t| t.board_id == id);
        let task_ids: Vec<&str> = removed.tasks.iter().map(|t| t.id.as_str()).collect();
        removed.subtasks = drain_where(&mut self.subtasks, |s| task_ids.contains(&s.task_id.as_str()));
        removed
    }
}

fn drain_where<T>(items: &mut Vec<T>, pred: impl Fn(&T) -> bool) -> Vec<T> {
    let (taken, kept): (Vec<T>, Vec<T>) = std::mem::take(items).into_iter().partition(|i| pred(i));
    *items = kept;
    taken
}
