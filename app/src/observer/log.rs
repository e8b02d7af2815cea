use super::ConcurrentObserver;
use crate::config::CONFIG;
use agri_core::{logs_to_csv, LogEntry, LogFilter, LogLevel};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Bounded in-memory system log, newest entry first
pub struct LogStore {
    entries: Mutex<VecDeque<LogEntry>>,
    capacity: usize,
}

impl LogStore {
    pub fn new(capacity: usize) -> Self {
        LogStore {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity: capacity.max(1),
        }
    }

    /// Stores an entry, dropping the oldest one once full.
    /// Returns a copy of the stored entry.
    pub fn push(&self, entry: LogEntry) -> LogEntry {
        match entry.level {
            LogLevel::Error => error!(
                action = entry.action.as_str(),
                device = entry.device.as_deref(),
                "{}",
                entry.details.as_deref().unwrap_or_default()
            ),
            LogLevel::Warning => warn!(
                action = entry.action.as_str(),
                device = entry.device.as_deref(),
                "{}",
                entry.details.as_deref().unwrap_or_default()
            ),
            LogLevel::Info | LogLevel::Success => info!(
                action = entry.action.as_str(),
                device = entry.device.as_deref(),
                "{}",
                entry.details.as_deref().unwrap_or_default()
            ),
        }

        let mut entries = self.entries.lock();
        entries.push_front(entry.clone());
        entries.truncate(self.capacity);
        entry
    }

    pub fn list(&self, filter: &LogFilter) -> Vec<LogEntry> {
        let entries = self.entries.lock();
        entries.iter().filter(|e| filter.matches(e)).cloned().collect()
    }

    /// Removes every entry, returns how many were removed
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.lock();
        let count = entries.len();
        entries.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

pub struct LogObserver {
    inner: Arc<ConcurrentObserver>,
}

impl Clone for LogObserver {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl LogObserver {
    pub fn new(inner: Arc<ConcurrentObserver>) -> Self {
        LogObserver { inner }
    }

    pub fn list(&self, filter: &LogFilter) -> Vec<LogEntry> {
        self.inner.logs.list(filter)
    }

    pub fn clear(&self) -> usize {
        let count = self.inner.logs.clear();
        info!("Cleared {} log entries", count);
        count
    }

    /// CSV export with timestamps in the configured timezone
    pub fn csv(&self, filter: &LogFilter) -> String {
        let entries = self.inner.logs.list(filter);
        logs_to_csv(&entries, &CONFIG.timezone())
    }
}
