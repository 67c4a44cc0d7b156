// Transient user notices (toast payloads)
// Accumulated in the session and drained into the next render snapshot;
// the host displays them short-lived, never as a blocking dialog.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// Creation timestamp in milliseconds.
    pub at: i64,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            at: chrono::Utc::now().timestamp_millis(),
        }
    }
}
