//! # Append-only diagnostic trail.
//!
//! Every entry is timestamped and either scoped to one job or engine-wide
//! (`job: None`). Entries are never mutated or removed; retention-based
//! eviction covers registry entries and results only, not the log.

use std::time::SystemTime;

use parking_lot::RwLock;

use crate::jobs::JobId;

/// One appended diagnostic line.
#[derive(Clone, Debug)]
pub struct LogEntry {
    /// When the entry was appended.
    pub time: SystemTime,
    /// The job this entry concerns; `None` marks an engine-wide message.
    pub job: Option<JobId>,
    /// Free-text message.
    pub message: String,
}

/// The queue's log: an append-only list behind a short-held lock.
///
/// Appending also emits the line through `tracing`, so the operational log
/// and the queryable trail stay in step.
pub(crate) struct JobLog {
    entries: RwLock<Vec<LogEntry>>,
}

impl JobLog {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    pub(crate) fn append(&self, job: Option<JobId>, message: impl Into<String>) {
        let message = message.into();
        match &job {
            Some(id) => tracing::info!(job = %id, "{message}"),
            None => tracing::info!("{message}"),
        }
        self.entries.write().push(LogEntry {
            time: SystemTime::now(),
            job,
            message,
        });
    }

    pub(crate) fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.read().clone()
    }
}
