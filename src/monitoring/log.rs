/*!
 * Event Log
 *
 * Injected logging capability for scheduler domain events (admissions,
 * evictions, completions, swap-ins). Passed into the engine at construction;
 * there is no process-wide logger instance.
 *
 * Every entry is mirrored to `tracing` at the matching level.
 */

use crate::core::clock::Clock;
use crate::core::limits::LOG_CAPACITY;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{error, info, warn};

/// Log entry severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Success,
}

/// One recorded domain event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    /// UTC wall time as `HH:MM:SS`
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
}

/// Logging capability handed to the scheduler
pub trait EventLog: Send + Sync + fmt::Debug {
    fn log(&self, level: LogLevel, message: String);

    fn info(&self, message: String) {
        self.log(LogLevel::Info, message);
    }

    fn warn(&self, message: String) {
        self.log(LogLevel::Warning, message);
    }

    fn error(&self, message: String) {
        self.log(LogLevel::Error, message);
    }

    fn success(&self, message: String) {
        self.log(LogLevel::Success, message);
    }
}

fn mirror(level: LogLevel, message: &str) {
    match level {
        LogLevel::Info => info!(target: "resalloc::events", "{}", message),
        LogLevel::Success => info!(target: "resalloc::events", success = true, "{}", message),
        LogLevel::Warning => warn!(target: "resalloc::events", "{}", message),
        LogLevel::Error => error!(target: "resalloc::events", "{}", message),
    }
}

/// Forwards to `tracing` only
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl EventLog for TracingLog {
    fn log(&self, level: LogLevel, message: String) {
        mirror(level, &message);
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLog;

impl EventLog for NullLog {
    fn log(&self, _level: LogLevel, _message: String) {}
}

type Listener = Box<dyn Fn(&LogEntry) + Send + Sync>;

struct BufferInner {
    entries: VecDeque<LogEntry>,
    next_id: u64,
}

/// Bounded in-memory log with an optional single listener
pub struct LogBuffer {
    inner: Mutex<BufferInner>,
    listener: Mutex<Option<Listener>>,
    clock: Arc<dyn Clock>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_capacity(clock, LOG_CAPACITY)
    }

    pub fn with_capacity(clock: Arc<dyn Clock>, capacity: usize) -> Self {
        Self {
            inner: Mutex::new(BufferInner {
                entries: VecDeque::with_capacity(capacity),
                next_id: 0,
            }),
            listener: Mutex::new(None),
            clock,
            capacity,
        }
    }

    /// Register the listener, replacing any previous one
    pub fn on_log<F>(&self, listener: F)
    where
        F: Fn(&LogEntry) + Send + Sync + 'static,
    {
        *self.listener.lock() = Some(Box::new(listener));
    }

    /// Copy of the retained entries, oldest first
    pub fn entries(&self) -> Vec<LogEntry> {
        self.inner.lock().entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Drop all entries and restart ids at zero
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.next_id = 0;
    }

    fn format_timestamp(&self) -> String {
        let nanos = i128::from(self.clock.now()) * 1_000_000;
        match OffsetDateTime::from_unix_timestamp_nanos(nanos) {
            Ok(t) => format!("{:02}:{:02}:{:02}", t.hour(), t.minute(), t.second()),
            Err(_) => "--:--:--".to_string(),
        }
    }
}

impl EventLog for LogBuffer {
    fn log(&self, level: LogLevel, message: String) {
        mirror(level, &message);

        let entry = {
            let mut inner = self.inner.lock();
            let entry = LogEntry {
                id: inner.next_id,
                timestamp: self.format_timestamp(),
                level,
                message,
            };
            inner.next_id += 1;
            inner.entries.push_back(entry.clone());
            if inner.entries.len() > self.capacity {
                inner.entries.pop_front();
            }
            entry
        };

        if let Some(listener) = self.listener.lock().as_ref() {
            listener(&entry);
        }
    }
}

impl fmt::Debug for LogBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogBuffer")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("has_listener", &self.listener.lock().is_some())
            .finish()
    }
}
