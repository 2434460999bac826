//! Observer-facing log lines.

use std::fmt;

use chrono::{DateTime, Local};

/// Timestamp format used in log lines and in the log file.
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One log entry, rendered as `[YYYY-MM-DD HH:MM:SS] message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub message: String,
}

impl LogEntry {
    /// Create an entry stamped with the current local time.
    pub fn now(message: impl Into<String>) -> Self {
        Self::at(Local::now(), message)
    }

    pub fn at(timestamp: DateTime<Local>, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            message: message.into(),
        }
    }

    /// Render the line without a trailing newline.
    pub fn line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}",
            self.timestamp.format(LOG_TIMESTAMP_FORMAT),
            self.message
        )
    }
}
