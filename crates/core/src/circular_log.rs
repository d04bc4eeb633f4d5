//! Bounded, timestamped log buffer
//!
//! Used by the results service for its server log and HTTP log. Once the
//! capacity is reached the oldest entry is dropped; readers are told that
//! entries were skipped through a trailing `...` marker.

use chrono::Local;
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Marker appended to [`CircularLog::entries`] when older entries were dropped
pub const SKIPPED_MARKER: &str = "...";

/// One log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogItem {
    /// Local time `HH:MM:SS` when the entry was added
    pub time: String,
    /// Logged text
    pub text: String,
}

impl LogItem {
    fn now(text: impl Into<String>) -> Self {
        Self {
            time: Local::now().format("%H:%M:%S").to_string(),
            text: text.into(),
        }
    }
}

impl fmt::Display for LogItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.time, self.text)
    }
}

#[derive(Debug, Default)]
struct Buffer {
    items: VecDeque<LogItem>,
    wrapped: bool,
}

/// Thread-safe circular log
#[derive(Debug)]
pub struct CircularLog {
    capacity: usize,
    buffer: Mutex<Buffer>,
}

impl CircularLog {
    /// Create a log holding at most `capacity` entries (minimum 1)
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            buffer: Mutex::new(Buffer {
                items: VecDeque::with_capacity(capacity),
                wrapped: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Buffer> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Maximum number of retained entries
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Add a timestamped entry, replacing the oldest one when full
    pub fn add(&self, text: impl Into<String>) {
        let mut buffer = self.lock();
        if buffer.items.len() == self.capacity {
            buffer.items.pop_front();
            buffer.wrapped = true;
        }
        buffer.items.push_back(LogItem::now(text));
    }

    /// Remove all entries
    pub fn clear(&self) {
        let mut buffer = self.lock();
        buffer.items.clear();
        buffer.wrapped = false;
    }

    /// Number of retained entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Whether the log holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// All entries, newest first
    ///
    /// If entries have been dropped, a [`SKIPPED_MARKER`] entry is appended last.
    #[must_use]
    pub fn entries(&self) -> Vec<LogItem> {
        let buffer = self.lock();
        let mut entries: Vec<LogItem> = buffer.items.iter().rev().cloned().collect();
        if buffer.wrapped {
            entries.push(LogItem::now(SKIPPED_MARKER));
        }
        entries
    }
}

impl fmt::Display for CircularLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries();
        for (i, item) in entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{item}")?;
        }
        Ok(())
    }
}
