//! `KanbanService`: the session-owning facade over the entity store.
//!
//! Every mutation follows the same shape: validate against local state,
//! attempt the remote write through `RemoteMirror`, apply locally no matter
//! what the remote said, record activity for tasks, then notify. Only
//! failures against local state (unknown ids, no session) reach the caller.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::{Mutex, watch};

use super::activity::{self, ActivityDay};
use super::clock::Clock;
use super::drag;
use super::filter::TaskFilters;
use super::identity::{AuthState, Identity};
use super::models::{
    ActivityDetails, ActivityEntry, ActivityKind, Board, BoardPatch, BoardView, Column,
    ColumnPatch, ColumnView, NewBoard, NewColumn, NewSubtask, NewTask, Subtask, SubtaskPatch,
    Task, TaskDetail, TaskPatch, Timestamp, new_id,
};
use super::notify::Notifier;
use super::remote::{Collection, ListQuery, RecordStore, SortOrder};
use super::seed;
use super::stats::{Analytics, DashboardSummary, SubtaskProgress, TaskStats, TimeRange, search_boards};
use super::store::{EntityStore, Removed};
use super::sync::{FlushReport, PendingWrite, RemoteMirror};
use crate::errors::{BoardError, RemoteError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// Loaded from the record store.
    Remote,
    /// The record store had no boards (or failed); demo data was seeded.
    /// When the store answered with no boards the demo records are written
    /// to it as well.
    Demo,
}

/// Summary of one `init_for_identity` load.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    pub user_id: String,
    pub source: DataSource,
    pub boards: usize,
    pub columns: usize,
    pub tasks: usize,
    pub subtasks: usize,
    pub synthesized_columns: usize,
    pub failed_collections: Vec<Collection>,
}

struct Session {
    identity: Identity,
    store: EntityStore,
    source: DataSource,
}

pub struct KanbanService {
    mirror: RemoteMirror,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    session: Option<Session>,
}

/// Log and announce a failed operation, handing the error back.
fn fail(notifier: &dyn Notifier, action: &str, err: BoardError) -> BoardError {
    tracing::warn!(error = %err, "Failed to {}", action);
    notifier.error(&format!("Failed to {}", action));
    err
}

fn loaded<T>(
    result: Result<Vec<T>, RemoteError>,
    collection: Collection,
    failed: &mut Vec<Collection>,
) -> Option<Vec<T>> {
    match result {
        Ok(records) => Some(records),
        Err(e) => {
            tracing::warn!(collection = %collection, error = %e, "Failed to load collection");
            failed.push(collection);
            None
        }
    }
}

/// Wire form of a patch plus the refreshed `updatedAt`.
fn remote_patch<P: Serialize>(patch: &P, now: Timestamp) -> Value {
    let mut value = serde_json::to_value(patch).unwrap_or_else(|_| Value::Object(Default::default()));
    if let Some(obj) = value.as_object_mut() {
        obj.insert("updatedAt".into(), Value::String(now.to_rfc3339()));
    }
    value
}

impl KanbanService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            mirror: RemoteMirror::new(store, clock.clone()),
            notifier,
            clock,
            session: None,
        }
    }

    // ── Session lifecycle ─────────────────────────────────────────────

    /// Load the identity's collections and make them the active session.
    ///
    /// The four collections are fetched concurrently and each failure is
    /// absorbed on its own. No boards (or a failed board fetch) means the
    /// demo data set is used instead; it is persisted best-effort only when
    /// the store really had no boards. Boards without columns get the four
    /// default columns, persisted best-effort, unless the column fetch
    /// failed and the board's columns are simply unknown.
    pub async fn init_for_identity(&mut self, identity: Identity) -> LoadReport {
        if self.session.is_some() {
            self.teardown();
        }

        let owner = ListQuery::owned_by(&identity.id);
        let board_query = owner.clone().order_by("createdAt", SortOrder::Desc);
        let position_query = owner.order_by("position", SortOrder::Asc);

        let (boards, columns, tasks, subtasks) = tokio::join!(
            self.mirror.list::<Board>(&board_query),
            self.mirror.list::<Column>(&position_query),
            self.mirror.list::<Task>(&position_query),
            self.mirror.list::<Subtask>(&position_query),
        );

        let mut failed = Vec::new();
        let boards = loaded(boards, Collection::Boards, &mut failed);
        let columns = loaded(columns, Collection::Columns, &mut failed);
        let tasks = loaded(tasks, Collection::Tasks, &mut failed);
        let subtasks = loaded(subtasks, Collection::Subtasks, &mut failed);

        let now = self.clock.now();
        let store_was_empty = matches!(&boards, Some(b) if b.is_empty());
        let columns_known = columns.is_some();
        let (mut store, source) = match boards {
            Some(boards) if !boards.is_empty() => (
                EntityStore::new(
                    boards,
                    columns.unwrap_or_default(),
                    tasks.unwrap_or_default(),
                    subtasks.unwrap_or_default(),
                ),
                DataSource::Remote,
            ),
            _ => {
                tracing::info!(user = %identity.id, "No boards in record store, using demo data");
                (seed::demo_dataset(&identity.id, now), DataSource::Demo)
            }
        };

        if source == DataSource::Demo && store_was_empty {
            let persisted = persist_all(&mut self.mirror, &store).await;
            tracing::debug!(user = %identity.id, persisted, "Wrote demo data to record store");
        }

        let bare_boards: Vec<String> = if columns_known {
            store
                .boards()
                .iter()
                .filter(|b| store.columns_of(&b.id).is_empty())
                .map(|b| b.id.clone())
                .collect()
        } else {
            Vec::new()
        };
        let mut synthesized = 0;
        for board_id in bare_boards {
            for column in seed::default_columns(&board_id, &identity.id, now) {
                self.mirror.create(&column).await;
                store.insert_column(column);
                synthesized += 1;
            }
        }

        let report = LoadReport {
            user_id: identity.id.clone(),
            source,
            boards: store.boards().len(),
            columns: store.columns().len(),
            tasks: store.tasks().len(),
            subtasks: store.subtasks().len(),
            synthesized_columns: synthesized,
            failed_collections: failed,
        };
        tracing::info!(
            user = %identity.id,
            source = ?report.source,
            boards = report.boards,
            tasks = report.tasks,
            synthesized_columns = report.synthesized_columns,
            "Session loaded"
        );

        self.session = Some(Session {
            identity,
            store,
            source,
        });
        report
    }

    /// Drop the active session and any writes still queued for it.
    pub fn teardown(&mut self) {
        if let Some(session) = self.session.take() {
            let dropped = self.mirror.discard_pending();
            if dropped > 0 {
                tracing::warn!(dropped, "Discarding unsynced writes at sign-out");
            }
            tracing::info!(user = %session.identity.id, "Session closed");
        }
    }

    /// React to an auth state change. Returns the load report when a new
    /// session was started.
    pub async fn apply_auth_state(&mut self, state: &AuthState) -> Option<LoadReport> {
        if state.is_loading {
            return None;
        }
        match &state.user {
            Some(user) if self.identity().map(|i| i.id.as_str()) == Some(user.id.as_str()) => None,
            Some(user) => Some(self.init_for_identity(user.clone()).await),
            None => {
                self.teardown();
                None
            }
        }
    }

    /// Drive init/teardown from an identity provider subscription until the
    /// provider goes away.
    pub async fn follow_auth(service: Arc<Mutex<Self>>, mut rx: watch::Receiver<AuthState>) {
        let initial = rx.borrow_and_update().clone();
        service.lock().await.apply_auth_state(&initial).await;
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().clone();
            service.lock().await.apply_auth_state(&state).await;
        }
        tracing::debug!("Identity provider closed, no longer following auth state");
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.session.as_ref().map(|s| &s.identity)
    }

    pub fn source(&self) -> Option<DataSource> {
        self.session.as_ref().map(|s| s.source)
    }

    /// The service clock's current time.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn session(&self) -> Result<&Session, BoardError> {
        self.session.as_ref().ok_or(BoardError::NotAuthenticated)
    }

    /// Read-only view of the session's collections.
    pub fn store(&self) -> Result<&EntityStore, BoardError> {
        self.session().map(|s| &s.store)
    }

    // ── Boards ────────────────────────────────────────────────────────

    /// Create a board along with its default columns.
    pub async fn create_board(&mut self, input: NewBoard) -> Result<Board, BoardError> {
        const ACTION: &str = "create board";
        let Self {
            mirror,
            notifier,
            clock,
            session,
        } = self;
        let session = session
            .as_mut()
            .ok_or_else(|| fail(&**notifier, ACTION, BoardError::NotAuthenticated))?;

        let now = clock.now();
        let board = Board {
            id: new_id("board"),
            title: input.title,
            description: input.description,
            owner_id: session.identity.id.clone(),
            created_at: now,
            updated_at: now,
        };
        mirror.create(&board).await;
        session.store.insert_board(board.clone());

        for column in seed::default_columns(&board.id, &board.owner_id, now) {
            mirror.create(&column).await;
            session.store.insert_column(column);
        }

        tracing::info!(board = %board.id, title = %board.title, "Board created");
        notifier.success("Board created successfully");
        Ok(board)
    }

    pub async fn update_board(&mut self, id: &str, patch: BoardPatch) -> Result<Board, BoardError> {
        const ACTION: &str = "update board";
        let Self {
            mirror,
            notifier,
            clock,
            session,
        } = self;
        let session = session
            .as_mut()
            .ok_or_else(|| fail(&**notifier, ACTION, BoardError::NotAuthenticated))?;
        if session.store.board(id).is_none() {
            return Err(fail(&**notifier, ACTION, BoardError::BoardNotFound { id: id.into() }));
        }

        let now = clock.now();
        mirror
            .update(Collection::Boards, id, remote_patch(&patch, now))
            .await;
        let board = session
            .store
            .board_mut(id)
            .map(|b| {
                b.apply(&patch, now);
                b.clone()
            })
            .ok_or_else(|| BoardError::BoardNotFound { id: id.into() })?;

        notifier.success("Board updated successfully");
        Ok(board)
    }

    /// Delete a board with its columns, tasks and subtasks.
    pub async fn delete_board(&mut self, id: &str) -> Result<Removed, BoardError> {
        const ACTION: &str = "delete board";
        let Self {
            mirror,
            notifier,
            clock,
            session,
        } = self;
        let session = session
            .as_mut()
            .ok_or_else(|| fail(&**notifier, ACTION, BoardError::NotAuthenticated))?;
        if session.store.board(id).is_none() {
            return Err(fail(&**notifier, ACTION, BoardError::BoardNotFound { id: id.into() }));
        }

        let now = clock.now();
        let removed = session.store.remove_board(id);
        mirror_removal(mirror, &removed).await;
        for task in &removed.tasks {
            session.store.record(activity::entry(
                ActivityKind::Deleted,
                task,
                &session.identity,
                ActivityDetails::default(),
                now,
            ));
        }

        tracing::info!(
            board = %id,
            columns = removed.columns.len(),
            tasks = removed.tasks.len(),
            subtasks = removed.subtasks.len(),
            "Board deleted"
        );
        notifier.success("Board deleted successfully");
        Ok(removed)
    }

    // ── Columns ───────────────────────────────────────────────────────

    pub async fn create_column(&mut self, input: NewColumn) -> Result<Column, BoardError> {
        const ACTION: &str = "create column";
        let Self {
            mirror,
            notifier,
            clock,
            session,
        } = self;
        let session = session
            .as_mut()
            .ok_or_else(|| fail(&**notifier, ACTION, BoardError::NotAuthenticated))?;
        if session.store.board(&input.board_id).is_none() {
            return Err(fail(
                &**notifier,
                ACTION,
                BoardError::BoardNotFound { id: input.board_id },
            ));
        }

        let now = clock.now();
        let column = Column {
            id: new_id("col"),
            title: input.title,
            position: session.store.columns_of(&input.board_id).len() as i64,
            board_id: input.board_id,
            owner_id: session.identity.id.clone(),
            created_at: now,
            updated_at: now,
        };
        mirror.create(&column).await;
        session.store.insert_column(column.clone());

        notifier.success("Column created successfully");
        Ok(column)
    }

    pub async fn update_column(&mut self, id: &str, patch: ColumnPatch) -> Result<Column, BoardError> {
        const ACTION: &str = "update column";
        let Self {
            mirror,
            notifier,
            clock,
            session,
        } = self;
        let session = session
            .as_mut()
            .ok_or_else(|| fail(&**notifier, ACTION, BoardError::NotAuthenticated))?;
        if session.store.column(id).is_none() {
            return Err(fail(&**notifier, ACTION, BoardError::ColumnNotFound { id: id.into() }));
        }

        let now = clock.now();
        mirror
            .update(Collection::Columns, id, remote_patch(&patch, now))
            .await;
        let column = session
            .store
            .column_mut(id)
            .map(|c| {
                c.apply(&patch, now);
                c.clone()
            })
            .ok_or_else(|| BoardError::ColumnNotFound { id: id.into() })?;

        notifier.success("Column updated successfully");
        Ok(column)
    }

    /// Delete a column together with the tasks in it.
    pub async fn delete_column(&mut self, id: &str) -> Result<Removed, BoardError> {
        const ACTION: &str = "delete column";
        let Self {
            mirror,
            notifier,
            clock,
            session,
        } = self;
        let session = session
            .as_mut()
            .ok_or_else(|| fail(&**notifier, ACTION, BoardError::NotAuthenticated))?;
        if session.store.column(id).is_none() {
            return Err(fail(&**notifier, ACTION, BoardError::ColumnNotFound { id: id.into() }));
        }

        let now = clock.now();
        let removed = session.store.remove_column(id);
        mirror_removal(mirror, &removed).await;
        for task in &removed.tasks {
            session.store.record(activity::entry(
                ActivityKind::Deleted,
                task,
                &session.identity,
                ActivityDetails::default(),
                now,
            ));
        }

        notifier.success("Column deleted successfully");
        Ok(removed)
    }

    // ── Tasks ─────────────────────────────────────────────────────────

    /// Create a task. Without a column it lands in the board's first column;
    /// it is appended after the tasks already in that column.
    pub async fn create_task(&mut self, input: NewTask) -> Result<Task, BoardError> {
        const ACTION: &str = "create task";
        let Self {
            mirror,
            notifier,
            clock,
            session,
        } = self;
        let session = session
            .as_mut()
            .ok_or_else(|| fail(&**notifier, ACTION, BoardError::NotAuthenticated))?;
        let store = &session.store;

        if store.board(&input.board_id).is_none() {
            return Err(fail(
                &**notifier,
                ACTION,
                BoardError::BoardNotFound { id: input.board_id },
            ));
        }
        let column_id = match input.column_id {
            Some(column_id) => match store.column(&column_id) {
                Some(column) if column.board_id == input.board_id => column_id,
                _ => {
                    return Err(fail(
                        &**notifier,
                        ACTION,
                        BoardError::ColumnNotFound { id: column_id },
                    ));
                }
            },
            None => match store.columns_of(&input.board_id).first() {
                Some(column) => column.id.clone(),
                None => {
                    return Err(fail(
                        &**notifier,
                        ACTION,
                        BoardError::NoColumns {
                            board_id: input.board_id,
                        },
                    ));
                }
            },
        };

        let now = clock.now();
        let task = Task {
            id: new_id("task"),
            title: input.title,
            description: input.description,
            position: store.tasks_in_column(&column_id).len() as i64,
            column_id,
            board_id: input.board_id,
            priority: input.priority.unwrap_or_default(),
            due_date: input.due_date,
            completed: false,
            owner_id: session.identity.id.clone(),
            created_at: now,
            updated_at: now,
        };
        mirror.create(&task).await;
        session.store.insert_task(task.clone());
        session.store.record(activity::entry(
            ActivityKind::Created,
            &task,
            &session.identity,
            ActivityDetails::default(),
            now,
        ));

        tracing::info!(task = %task.id, column = %task.column_id, "Task created");
        notifier.success("Task created successfully");
        Ok(task)
    }

    /// Merge `patch` into a task and record what kind of change it was.
    /// Moving to a column on another board carries `boardId` along.
    pub async fn update_task(&mut self, id: &str, patch: TaskPatch) -> Result<Task, BoardError> {
        const ACTION: &str = "update task";
        let Self {
            mirror,
            notifier,
            clock,
            session,
        } = self;
        let session = session
            .as_mut()
            .ok_or_else(|| fail(&**notifier, ACTION, BoardError::NotAuthenticated))?;

        let Some(prior) = session.store.task(id).cloned() else {
            return Err(fail(&**notifier, ACTION, BoardError::TaskNotFound { id: id.into() }));
        };
        let target_board = match patch.column_id.as_deref() {
            Some(column_id) => match session.store.column(column_id) {
                Some(column) => Some(column.board_id.clone()),
                None => {
                    return Err(fail(
                        &**notifier,
                        ACTION,
                        BoardError::ColumnNotFound {
                            id: column_id.into(),
                        },
                    ));
                }
            },
            None => None,
        }
        .filter(|board_id| *board_id != prior.board_id);

        let (kind, details) = activity::classify(&prior, &patch, session.store.columns());

        let now = clock.now();
        let mut wire = remote_patch(&patch, now);
        if let (Some(board_id), Some(obj)) = (&target_board, wire.as_object_mut()) {
            obj.insert("boardId".into(), Value::String(board_id.clone()));
        }
        mirror.update(Collection::Tasks, id, wire).await;

        let task = session
            .store
            .task_mut(id)
            .map(|t| {
                t.apply(&patch, now);
                if let Some(board_id) = target_board {
                    t.board_id = board_id;
                }
                t.clone()
            })
            .ok_or_else(|| BoardError::TaskNotFound { id: id.into() })?;
        session
            .store
            .record(activity::entry(kind, &prior, &session.identity, details, now));

        tracing::debug!(task = %id, activity = %kind, "Task updated");
        notifier.success("Task updated successfully");
        Ok(task)
    }

    /// Delete a task and its subtasks.
    pub async fn delete_task(&mut self, id: &str) -> Result<Removed, BoardError> {
        const ACTION: &str = "delete task";
        let Self {
            mirror,
            notifier,
            clock,
            session,
        } = self;
        let session = session
            .as_mut()
            .ok_or_else(|| fail(&**notifier, ACTION, BoardError::NotAuthenticated))?;
        if session.store.task(id).is_none() {
            return Err(fail(&**notifier, ACTION, BoardError::TaskNotFound { id: id.into() }));
        }

        let now = clock.now();
        mirror.delete(Collection::Tasks, id).await;
        let removed = session.store.remove_task(id);
        mirror
            .delete_many(Collection::Subtasks, &removed.subtask_ids())
            .await;
        for task in &removed.tasks {
            session.store.record(activity::entry(
                ActivityKind::Deleted,
                task,
                &session.identity,
                ActivityDetails::default(),
                now,
            ));
        }

        notifier.success("Task deleted successfully");
        Ok(removed)
    }

    /// Drop a dragged task onto a task or column. Returns the updated task,
    /// or `None` when the drop leaves it in the same column.
    pub async fn drop_task(&mut self, task_id: &str, target_id: &str) -> Result<Option<Task>, BoardError> {
        let patch = {
            let store = match self.session() {
                Ok(session) => &session.store,
                Err(e) => return Err(fail(&*self.notifier, "move task", e)),
            };
            let Some(dragged) = store.task(task_id) else {
                return Err(fail(
                    &*self.notifier,
                    "move task",
                    BoardError::TaskNotFound { id: task_id.into() },
                ));
            };
            drag::plan_drop(store.tasks(), dragged, target_id)
        };
        match patch {
            Some(patch) => self.update_task(task_id, patch).await.map(Some),
            None => {
                tracing::debug!(task = %task_id, "Dropped into its own column, nothing to do");
                Ok(None)
            }
        }
    }

    // ── Subtasks ──────────────────────────────────────────────────────

    pub async fn create_subtask(&mut self, input: NewSubtask) -> Result<Subtask, BoardError> {
        const ACTION: &str = "create subtask";
        let Self {
            mirror,
            notifier,
            clock,
            session,
        } = self;
        let session = session
            .as_mut()
            .ok_or_else(|| fail(&**notifier, ACTION, BoardError::NotAuthenticated))?;
        if session.store.task(&input.task_id).is_none() {
            return Err(fail(
                &**notifier,
                ACTION,
                BoardError::TaskNotFound { id: input.task_id },
            ));
        }

        let now = clock.now();
        let position = input
            .position
            .unwrap_or_else(|| session.store.subtasks_of(&input.task_id).len() as i64);
        let subtask = Subtask {
            id: new_id("subtask"),
            title: input.title,
            task_id: input.task_id,
            completed: false,
            position,
            owner_id: session.identity.id.clone(),
            created_at: now,
            updated_at: now,
        };
        mirror.create(&subtask).await;
        session.store.insert_subtask(subtask.clone());

        notifier.success("Subtask created successfully");
        Ok(subtask)
    }

    pub async fn update_subtask(&mut self, id: &str, patch: SubtaskPatch) -> Result<Subtask, BoardError> {
        const ACTION: &str = "update subtask";
        let Self {
            mirror,
            notifier,
            clock,
            session,
        } = self;
        let session = session
            .as_mut()
            .ok_or_else(|| fail(&**notifier, ACTION, BoardError::NotAuthenticated))?;
        if session.store.subtask(id).is_none() {
            return Err(fail(&**notifier, ACTION, BoardError::SubtaskNotFound { id: id.into() }));
        }

        let now = clock.now();
        mirror
            .update(Collection::Subtasks, id, remote_patch(&patch, now))
            .await;
        let subtask = session
            .store
            .subtask_mut(id)
            .map(|s| {
                s.apply(&patch, now);
                s.clone()
            })
            .ok_or_else(|| BoardError::SubtaskNotFound { id: id.into() })?;

        notifier.success("Subtask updated successfully");
        Ok(subtask)
    }

    pub async fn delete_subtask(&mut self, id: &str) -> Result<Subtask, BoardError> {
        const ACTION: &str = "delete subtask";
        let Self {
            mirror,
            notifier,
            session,
            ..
        } = self;
        let session = session
            .as_mut()
            .ok_or_else(|| fail(&**notifier, ACTION, BoardError::NotAuthenticated))?;
        if session.store.subtask(id).is_none() {
            return Err(fail(&**notifier, ACTION, BoardError::SubtaskNotFound { id: id.into() }));
        }

        mirror.delete(Collection::Subtasks, id).await;
        let subtask = session
            .store
            .remove_subtask(id)
            .ok_or_else(|| BoardError::SubtaskNotFound { id: id.into() })?;

        notifier.success("Subtask deleted successfully");
        Ok(subtask)
    }

    // ── Queries ───────────────────────────────────────────────────────

    /// Boards matching `query` (all boards for an empty query).
    pub fn boards(&self, query: &str) -> Result<Vec<Board>, BoardError> {
        let store = self.store()?;
        Ok(search_boards(store.boards(), query).into_iter().cloned().collect())
    }

    /// A board with its columns in order and each column's filtered tasks.
    pub fn board_view(&self, board_id: &str, filters: &TaskFilters) -> Result<BoardView, BoardError> {
        let store = self.store()?;
        let board = store
            .board(board_id)
            .cloned()
            .ok_or_else(|| BoardError::BoardNotFound { id: board_id.into() })?;
        let visible = filters.apply(&store.tasks_of_board(board_id), self.clock.now());

        let columns = store
            .columns_of(board_id)
            .into_iter()
            .map(|column| {
                let mut tasks: Vec<Task> = visible
                    .iter()
                    .filter(|t| t.column_id == column.id)
                    .map(|t| (*t).clone())
                    .collect();
                tasks.sort_by_key(|t| t.position);
                ColumnView {
                    column: column.clone(),
                    tasks,
                }
            })
            .collect();

        Ok(BoardView {
            board,
            columns,
            active_filters: filters.active_count(),
        })
    }

    pub fn filtered_tasks(&self, board_id: &str, filters: &TaskFilters) -> Result<Vec<Task>, BoardError> {
        let store = self.store()?;
        if store.board(board_id).is_none() {
            return Err(BoardError::BoardNotFound { id: board_id.into() });
        }
        let tasks = store.tasks_of_board(board_id);
        Ok(filters
            .apply(&tasks, self.clock.now())
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn board_stats(&self, board_id: &str) -> Result<TaskStats, BoardError> {
        let store = self.store()?;
        if store.board(board_id).is_none() {
            return Err(BoardError::BoardNotFound { id: board_id.into() });
        }
        Ok(TaskStats::compute(&store.tasks_of_board(board_id), self.clock.now()))
    }

    pub fn analytics(&self, board_id: &str, range: TimeRange) -> Result<Analytics, BoardError> {
        let store = self.store()?;
        if store.board(board_id).is_none() {
            return Err(BoardError::BoardNotFound { id: board_id.into() });
        }
        Ok(Analytics::compute(
            &store.tasks_of_board(board_id),
            range,
            self.clock.now(),
        ))
    }

    pub fn dashboard(&self) -> Result<DashboardSummary, BoardError> {
        let store = self.store()?;
        let boards: Vec<&Board> = store.boards().iter().collect();
        Ok(DashboardSummary::compute(&boards, &store.all_tasks(), self.clock.now()))
    }

    /// Session activity, newest first.
    pub fn activity(&self) -> Result<Vec<ActivityEntry>, BoardError> {
        Ok(self.store()?.activity().to_vec())
    }

    /// Session activity grouped by day for display.
    pub fn activity_feed(&self) -> Result<Vec<ActivityDay>, BoardError> {
        let store = self.store()?;
        Ok(activity::group_by_day(store.activity(), self.clock.now()))
    }

    pub fn task_detail(&self, task_id: &str) -> Result<TaskDetail, BoardError> {
        let store = self.store()?;
        let task = store
            .task(task_id)
            .cloned()
            .ok_or_else(|| BoardError::TaskNotFound { id: task_id.into() })?;
        let subtasks = store.subtasks_of(task_id);
        Ok(TaskDetail {
            progress: SubtaskProgress::compute(&subtasks),
            subtasks: subtasks.into_iter().cloned().collect(),
            task,
        })
    }

    // ── Sync ──────────────────────────────────────────────────────────

    pub fn pending_writes(&self) -> Vec<PendingWrite> {
        self.mirror.pending().to_vec()
    }

    pub async fn flush_remote(&mut self) -> FlushReport {
        self.mirror.flush().await
    }
}

/// Write every record of a freshly seeded store. Returns how many landed.
async fn persist_all(mirror: &mut RemoteMirror, store: &EntityStore) -> usize {
    let mut written = 0;
    for board in store.boards() {
        written += usize::from(mirror.create(board).await);
    }
    for column in store.columns() {
        written += usize::from(mirror.create(column).await);
    }
    for task in store.tasks() {
        written += usize::from(mirror.create(task).await);
    }
    for subtask in store.subtasks() {
        written += usize::from(mirror.create(subtask).await);
    }
    written
}

/// Mirror a cascading removal: subtasks and tasks as parallel batches, then
/// columns and boards.
async fn mirror_removal(mirror: &mut RemoteMirror, removed: &Removed) {
    mirror
        .delete_many(Collection::Subtasks, &removed.subtask_ids())
        .await;
    mirror.delete_many(Collection::Tasks, &removed.task_ids()).await;
    mirror
        .delete_many(Collection::Columns, &removed.column_ids())
        .await;
    for board in &removed.boards {
        mirror.delete(Collection::Boards, &board.id).await;
    }
}
