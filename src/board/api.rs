use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::activity;
use super::filter::{FilterParams, TaskFilters};
use super::identity::{AuthState, IdentityProvider};
use super::models::{
    ActivityEntry, BoardPatch, ColumnPatch, NewBoard, NewColumn, NewSubtask, NewTask, Priority,
    SubtaskPatch, Task, TaskPatch, Timestamp,
};
use super::notify::RecordingNotifier;
use super::service::{DataSource, KanbanService};
use super::stats::TimeRange;
use crate::errors::BoardError;

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub service: Arc<Mutex<KanbanService>>,
    pub identity: Arc<dyn IdentityProvider>,
    pub notices: Arc<RecordingNotifier>,
}

pub type SharedState = Arc<AppState>;

// ── Request payload types ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct BoardSearchQuery {
    pub search: Option<String>,
}

#[derive(Deserialize)]
pub struct AnalyticsQuery {
    pub range: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateColumnRequest {
    pub title: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub column_id: Option<String>,
    pub priority: Option<Priority>,
    pub due_date: Option<Timestamp>,
}

#[derive(Deserialize)]
pub struct CreateSubtaskRequest {
    pub title: String,
    pub position: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropRequest {
    pub target_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub auth: AuthState,
    pub source: Option<DataSource>,
    pub pending_writes: usize,
}

#[derive(Serialize)]
pub struct DropResult {
    pub moved: bool,
    pub task: Option<Task>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityItem {
    #[serde(flatten)]
    pub entry: ActivityEntry,
    pub message: String,
    pub time_ago: String,
}

// ── Error handling ────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

impl From<BoardError> for ApiError {
    fn from(err: BoardError) -> Self {
        let msg = err.to_string();
        match err {
            BoardError::NotAuthenticated => ApiError::Unauthorized(msg),
            BoardError::BoardNotFound { .. }
            | BoardError::ColumnNotFound { .. }
            | BoardError::TaskNotFound { .. }
            | BoardError::SubtaskNotFound { .. } => ApiError::NotFound(msg),
            BoardError::NoColumns { .. }
            | BoardError::InvalidPriority(_)
            | BoardError::InvalidFilter(_) => ApiError::BadRequest(msg),
        }
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route(
            "/api/session",
            get(get_session).post(login).delete(logout),
        )
        .route("/api/boards", get(list_boards).post(create_board))
        .route(
            "/api/boards/{id}",
            get(get_board).patch(update_board).delete(delete_board),
        )
        .route("/api/boards/{id}/columns", post(create_column))
        .route("/api/boards/{id}/tasks", get(list_tasks).post(create_task))
        .route("/api/boards/{id}/stats", get(board_stats))
        .route("/api/boards/{id}/analytics", get(board_analytics))
        .route(
            "/api/columns/{id}",
            patch(update_column).delete(delete_column),
        )
        .route(
            "/api/tasks/{id}",
            get(get_task).patch(update_task).delete(delete_task),
        )
        .route("/api/tasks/{id}/drop", post(drop_task))
        .route("/api/tasks/{id}/subtasks", post(create_subtask))
        .route(
            "/api/subtasks/{id}",
            patch(update_subtask).delete(delete_subtask),
        )
        .route("/api/activity", get(list_activity))
        .route("/api/activity/feed", get(activity_feed))
        .route("/api/dashboard", get(dashboard))
        .route("/api/sync", get(pending_writes))
        .route("/api/sync/flush", post(flush_writes))
        .route("/api/notices", get(drain_notices))
        .route("/health", get(health_check))
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

async fn session_status(state: &SharedState) -> SessionStatus {
    let service = state.service.lock().await;
    SessionStatus {
        auth: state.identity.current(),
        source: service.source(),
        pending_writes: service.pending_writes().len(),
    }
}

async fn get_session(State(state): State<SharedState>) -> impl IntoResponse {
    Json(session_status(&state).await)
}

async fn login(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    state
        .identity
        .login()
        .await
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;
    let auth = state.identity.current();
    state.service.lock().await.apply_auth_state(&auth).await;
    Ok(Json(session_status(&state).await))
}

async fn logout(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    state
        .identity
        .logout()
        .await
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;
    let auth = state.identity.current();
    state.service.lock().await.apply_auth_state(&auth).await;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_boards(
    State(state): State<SharedState>,
    Query(query): Query<BoardSearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let service = state.service.lock().await;
    let boards = service.boards(query.search.as_deref().unwrap_or_default())?;
    Ok(Json(boards))
}

async fn create_board(
    State(state): State<SharedState>,
    Json(req): Json<NewBoard>,
) -> Result<impl IntoResponse, ApiError> {
    let board = state.service.lock().await.create_board(req).await?;
    Ok((StatusCode::CREATED, Json(board)))
}

async fn get_board(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(params): Query<FilterParams>,
) -> Result<impl IntoResponse, ApiError> {
    let filters = TaskFilters::parse(&params)?;
    let view = state.service.lock().await.board_view(&id, &filters)?;
    Ok(Json(view))
}

async fn update_board(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(patch): Json<BoardPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let board = state.service.lock().await.update_board(&id, patch).await?;
    Ok(Json(board))
}

async fn delete_board(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.service.lock().await.delete_board(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_column(
    State(state): State<SharedState>,
    Path(board_id): Path<String>,
    Json(req): Json<CreateColumnRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let column = state
        .service
        .lock()
        .await
        .create_column(NewColumn {
            board_id,
            title: req.title,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(column)))
}

async fn list_tasks(
    State(state): State<SharedState>,
    Path(board_id): Path<String>,
    Query(params): Query<FilterParams>,
) -> Result<impl IntoResponse, ApiError> {
    let filters = TaskFilters::parse(&params)?;
    let tasks = state.service.lock().await.filtered_tasks(&board_id, &filters)?;
    Ok(Json(tasks))
}

async fn create_task(
    State(state): State<SharedState>,
    Path(board_id): Path<String>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = NewTask {
        board_id,
        title: req.title,
        description: req.description,
        column_id: req.column_id,
        priority: req.priority,
        due_date: req.due_date,
    };
    let task = state.service.lock().await.create_task(input).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn board_stats(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = state.service.lock().await.board_stats(&id)?;
    Ok(Json(stats))
}

async fn board_analytics(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let range = match query.range.as_deref() {
        None => TimeRange::default(),
        Some(raw) => raw.parse().map_err(BoardError::InvalidFilter)?,
    };
    let analytics = state.service.lock().await.analytics(&id, range)?;
    Ok(Json(analytics))
}

async fn update_column(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(patch): Json<ColumnPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let column = state.service.lock().await.update_column(&id, patch).await?;
    Ok(Json(column))
}

async fn delete_column(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.service.lock().await.delete_column(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_task(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state.service.lock().await.task_detail(&id)?;
    Ok(Json(detail))
}

async fn update_task(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(patch): Json<TaskPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let task = state.service.lock().await.update_task(&id, patch).await?;
    Ok(Json(task))
}

async fn delete_task(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.service.lock().await.delete_task(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn drop_task(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<DropRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let task = state.service.lock().await.drop_task(&id, &req.target_id).await?;
    Ok(Json(DropResult {
        moved: task.is_some(),
        task,
    }))
}

async fn create_subtask(
    State(state): State<SharedState>,
    Path(task_id): Path<String>,
    Json(req): Json<CreateSubtaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = NewSubtask {
        task_id,
        title: req.title,
        position: req.position,
    };
    let subtask = state.service.lock().await.create_subtask(input).await?;
    Ok((StatusCode::CREATED, Json(subtask)))
}

async fn update_subtask(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(patch): Json<SubtaskPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let subtask = state.service.lock().await.update_subtask(&id, patch).await?;
    Ok(Json(subtask))
}

async fn delete_subtask(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.service.lock().await.delete_subtask(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_activity(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let service = state.service.lock().await;
    let now = service.now();
    let items: Vec<ActivityItem> = service
        .activity()?
        .into_iter()
        .map(|entry| ActivityItem {
            message: activity::describe(&entry),
            time_ago: activity::time_ago(entry.timestamp, now),
            entry,
        })
        .collect();
    Ok(Json(items))
}

async fn activity_feed(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let feed = state.service.lock().await.activity_feed()?;
    Ok(Json(feed))
}

async fn dashboard(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let summary = state.service.lock().await.dashboard()?;
    Ok(Json(summary))
}

async fn pending_writes(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.service.lock().await.pending_writes())
}

async fn flush_writes(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.service.lock().await.flush_remote().await)
}

async fn drain_notices(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.notices.drain())
}
