//! Fire-and-forget user notifications.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// Writes notices to the log only.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        tracing::info!(notice = "success", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(notice = "error", "{}", message);
    }
}

/// Notices kept for polling before the oldest are discarded.
pub const DEFAULT_NOTICE_CAPACITY: usize = 100;

/// Logs notices and keeps the most recent ones until drained, so a front end
/// can poll them.
pub struct RecordingNotifier {
    capacity: usize,
    notices: Mutex<VecDeque<Notice>>,
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_NOTICE_CAPACITY)
    }
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            notices: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn drain(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|mut n| n.drain(..).collect())
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|n| n.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn push(&self, level: NoticeLevel, message: &str) {
        if let Ok(mut notices) = self.notices.lock() {
            if notices.len() == self.capacity {
                notices.pop_front();
            }
            notices.push_back(Notice {
                level,
                message: message.to_string(),
            });
        }
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        TracingNotifier.success(message);
        self.push(NoticeLevel::Success, message);
    }

    fn error(&self, message: &str) {
        TracingNotifier.error(message);
        self.push(NoticeLevel::Error, message);
    }
}
