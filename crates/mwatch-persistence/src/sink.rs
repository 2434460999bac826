//! Log sink: durable text file plus bounded replay buffer.
//!
//! Every line is:
//! - appended to the log file (`[YYYY-MM-DD HH:MM:SS] message\n`)
//! - pushed into a ring buffer holding the most recent `history_capacity` lines
//! - published to observers as a `log_message` event
//!
//! File and buffer are mutated under one lock, so lines from the worker and
//! from command handlers interleave but never tear. The file is best-effort:
//! the first write failure is reported as a log line, later ones only bump a
//! counter, and the buffer keeps working either way.

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use mwatch_core::{EventBus, HubEvent, LogEntry};
use mwatch_telemetry::Metrics;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{PersistenceError, PersistenceResult};

/// Message of the entry emitted after the log has been cleared.
pub const CLEAR_SENTINEL: &str = "--- Logs cleared ---";

/// Log sink configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log file path.
    #[serde(default = "default_path")]
    pub path: PathBuf,
    /// Lines kept in memory for replay.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_path() -> PathBuf {
    PathBuf::from("bot_log.txt")
}

fn default_history_capacity() -> usize {
    200
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            history_capacity: default_history_capacity(),
        }
    }
}

impl LogConfig {
    pub fn validate(&self) -> PersistenceResult<()> {
        if self.history_capacity == 0 {
            return Err(PersistenceError::Config(
                "history_capacity must be at least 1".to_string(),
            ));
        }
        if self.path.as_os_str().is_empty() {
            return Err(PersistenceError::Config("path must not be empty".to_string()));
        }
        Ok(())
    }
}

struct SinkInner {
    /// Open append handle (opened lazily, dropped after a failure).
    writer: Option<BufWriter<File>>,
    buffer: VecDeque<String>,
    /// The current failure streak has already been reported to observers.
    failure_reported: bool,
}

/// Durable, replayable log.
pub struct LogSink {
    path: PathBuf,
    capacity: usize,
    bus: EventBus,
    inner: Mutex<SinkInner>,
}

impl LogSink {
    /// Create a sink, seeding the replay buffer from the tail of an existing
    /// log file so history survives a restart.
    pub fn open(config: &LogConfig, bus: EventBus) -> Self {
        let capacity = config.history_capacity.max(1);
        let buffer = match read_tail(&config.path, capacity) {
            Ok(lines) => lines,
            Err(PersistenceError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                VecDeque::with_capacity(capacity)
            }
            Err(e) => {
                warn!(error = %e, path = %config.path.display(), "Failed to read log history");
                VecDeque::with_capacity(capacity)
            }
        };

        info!(
            path = %config.path.display(),
            restored = buffer.len(),
            capacity,
            "Log sink opened"
        );

        Self {
            path: config.path.clone(),
            capacity,
            bus,
            inner: Mutex::new(SinkInner {
                writer: None,
                buffer,
                failure_reported: false,
            }),
        }
    }

    /// Append a message. Returns the rendered line.
    pub fn append(&self, message: impl Into<String>) -> String {
        let entry = LogEntry::now(message);
        info!(target: "mwatch::log", "{}", entry.message);

        let mut inner = self.inner.lock();
        self.push_locked(&mut inner, &entry, false)
    }

    /// Buffered lines, oldest first.
    pub fn replay(&self) -> Vec<String> {
        self.inner.lock().buffer.iter().cloned().collect()
    }

    /// Buffered lines plus whatever `during` returns, with appends held off
    /// until both are taken.
    ///
    /// Lines are published under the same lock, so a bus subscription made
    /// inside `during` sees exactly the lines after the returned history.
    pub fn replay_while<T>(&self, during: impl FnOnce() -> T) -> (Vec<String>, T) {
        let inner = self.inner.lock();
        let lines = inner.buffer.iter().cloned().collect();
        (lines, during())
    }

    /// Number of buffered lines.
    pub fn len(&self) -> usize {
        self.inner.lock().buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Truncate the file, empty the buffer and emit the clear sentinel.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.writer = None;
        inner.buffer.clear();

        match File::create(&self.path) {
            Ok(_) => {
                inner.failure_reported = false;
                debug!(path = %self.path.display(), "Log file truncated");
            }
            Err(e) => self.report_failure(&mut inner, &e.into()),
        }

        let entry = LogEntry::now(CLEAR_SENTINEL);
        info!(target: "mwatch::log", "{}", entry.message);
        self.push_locked(&mut inner, &entry, true);
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn push_locked(&self, inner: &mut SinkInner, entry: &LogEntry, clear: bool) -> String {
        let line = entry.line();
        let write_result = self.write_line(inner, &line);

        self.buffer_and_publish(inner, line.clone(), clear);

        if let Err(e) = write_result {
            inner.writer = None;
            self.report_failure(inner, &e);
        }

        line
    }

    fn buffer_and_publish(&self, inner: &mut SinkInner, line: String, clear: bool) {
        while inner.buffer.len() >= self.capacity {
            inner.buffer.pop_front();
        }
        inner.buffer.push_back(line.clone());
        self.bus.publish(HubEvent::LogMessage { data: line, clear });
    }

    fn write_line(&self, inner: &mut SinkInner, line: &str) -> PersistenceResult<()> {
        if inner.writer.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            inner.writer = Some(BufWriter::new(file));
        }

        if let Some(writer) = inner.writer.as_mut() {
            writeln!(writer, "{}", line)?;
            writer.flush()?;
        }

        // A successful write ends the failure streak.
        inner.failure_reported = false;
        Ok(())
    }

    fn report_failure(&self, inner: &mut SinkInner, error: &PersistenceError) {
        Metrics::log_write_failed();
        if inner.failure_reported {
            return;
        }
        inner.failure_reported = true;

        warn!(error = %error, path = %self.path.display(), "Log file write failed");
        let notice = LogEntry::now(format!(
            "[!!] Log file write failed ({error}). Continuing with in-memory log only."
        ));
        self.buffer_and_publish(inner, notice.line(), false);
    }
}

impl std::fmt::Debug for LogSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSink")
            .field("path", &self.path)
            .field("capacity", &self.capacity)
            .field("buffered", &self.len())
            .finish()
    }
}

/// Read the last `capacity` lines of a file.
///
/// Bytes that are not UTF-8 are replaced, not rejected: one bad line must
/// not cost the whole history.
fn read_tail(path: &Path, capacity: usize) -> PersistenceResult<VecDeque<String>> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut tail = VecDeque::with_capacity(capacity);
    let mut raw = Vec::new();
    loop {
        raw.clear();
        if reader.read_until(b'\n', &mut raw)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&raw)
            .trim_end_matches(['\n', '\r'])
            .to_string();
        if line.is_empty() {
            continue;
        }
        if tail.len() == capacity {
            tail.pop_front();
        }
        tail.push_back(line);
    }
    Ok(tail)
}
