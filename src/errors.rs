//! Typed error hierarchy for taskboard.
//!
//! Two enums cover the two layers:
//! - `BoardError` — failures of an operation against the local session state
//! - `RemoteError` — record store failures, always absorbed by the mirror

use thiserror::Error;

/// Errors returned by board operations.
///
/// These only arise when an operation targets something the local store does
/// not hold (or no one is signed in). Remote failures never surface here.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Board {id} not found")]
    BoardNotFound { id: String },

    #[error("Column {id} not found")]
    ColumnNotFound { id: String },

    #[error("Task {id} not found")]
    TaskNotFound { id: String },

    #[error("Subtask {id} not found")]
    SubtaskNotFound { id: String },

    #[error("Board {board_id} has no columns to place a task in")]
    NoColumns { board_id: String },

    #[error("Invalid priority '{0}'")]
    InvalidPriority(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),
}

/// Errors from a record store backend.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Record store unavailable: {0}")]
    Unavailable(String),

    #[error("Record store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Record {id} not found in {collection}")]
    NotFound { collection: String, id: String },

    #[error("Failed to decode {collection} record: {source}")]
    Decode {
        collection: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Database error: {0}")]
    Database(#[source] anyhow::Error),

    #[error("Record store lock poisoned")]
    LockPoisoned,
}

impl RemoteError {
    /// A missing record stays missing, so replaying the write cannot help.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, RemoteError::NotFound { .. })
    }
}
