//! # Job records: identity, lifecycle metadata, and query views.
//!
//! A [`JobRecord`] is created when work is submitted and carries everything
//! the engine knows about that job: its [`JobId`], label, the deferred work,
//! and the mutable lifecycle fields stamped by the dispatcher.
//!
//! ## Lifecycle
//! ```text
//! submit ──► Planned ──► Started ──► Completed
//!                              └───► Faulted
//! ```
//!
//! ## Rules
//! - Status is **derived** from the timestamps, never stored: a completion
//!   stamp means terminal (fault message distinguishes `Faulted` from
//!   `Completed`), else a start stamp means `Started`, else `Planned`.
//! - Transitions are monotonic; only the dispatcher stamps them.
//! - Faulted records are stamped with a completion time and duration exactly
//!   like completed ones, so retention-based eviction covers both.
//! - [`JobStatus::NotFound`] is a query sentinel only; no record ever holds it.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::RwLock;
use uuid::Uuid;

use crate::jobs::JobRef;
use crate::queue::JobValue;

/// Unique job identity, generated at submission and never reused.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct JobId(Uuid);

impl JobId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status derived from a record's timestamps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobStatus {
    /// Submitted, waiting in the planned queue.
    Planned,
    /// Dequeued by the dispatcher; executing or waiting inside its own work.
    Started,
    /// Finished normally.
    Completed,
    /// Finished with an error or panic; see the record's fault message.
    Faulted,
    /// Query sentinel for an unknown id; never stored on a record.
    NotFound,
}

impl JobStatus {
    /// Returns `true` for the terminal dispositions.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Faulted)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Planned => "planned",
            JobStatus::Started => "started",
            JobStatus::Completed => "completed",
            JobStatus::Faulted => "faulted",
            JobStatus::NotFound => "not_found",
        };
        f.write_str(s)
    }
}

/// Fields stamped during execution, guarded together so query views read one
/// consistent snapshot.
#[derive(Default)]
struct RunState {
    started_at: Option<SystemTime>,
    completed_at: Option<SystemTime>,
    execution_time: Option<Duration>,
    fault: Option<String>,
    result: Option<JobValue>,
}

impl RunState {
    fn status(&self) -> JobStatus {
        if self.completed_at.is_some() {
            if self.fault.is_some() {
                JobStatus::Faulted
            } else {
                JobStatus::Completed
            }
        } else if self.started_at.is_some() {
            JobStatus::Started
        } else {
            JobStatus::Planned
        }
    }
}

/// A submitted job plus its lifecycle metadata.
///
/// Records are shared (`Arc<JobRecord>`) between the planned queue, the
/// running registry, and the worker executing the job. Immutable identity
/// lives directly on the struct; fields the dispatcher stamps live behind a
/// short-held lock.
pub struct JobRecord {
    id: JobId,
    label: String,
    work: JobRef,
    planned_at: SystemTime,
    state: RwLock<RunState>,
}

impl JobRecord {
    /// Creates a fresh `Planned` record with a newly generated id.
    pub fn new(label: impl Into<String>, work: JobRef) -> Self {
        Self {
            id: JobId::new(),
            label: label.into(),
            work,
            planned_at: SystemTime::now(),
            state: RwLock::new(RunState::default()),
        }
    }

    /// The unique id generated at submission.
    #[inline]
    pub fn id(&self) -> &JobId {
        &self.id
    }

    /// The human-readable label supplied at submission.
    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// When the record was created.
    #[inline]
    pub fn planned_at(&self) -> SystemTime {
        self.planned_at
    }

    pub fn started_at(&self) -> Option<SystemTime> {
        self.state.read().started_at
    }

    pub fn completed_at(&self) -> Option<SystemTime> {
        self.state.read().completed_at
    }

    /// Wall-clock execution duration, measured monotonically by the worker.
    pub fn execution_time(&self) -> Option<Duration> {
        self.state.read().execution_time
    }

    /// The fault message, present only after a failed execution.
    pub fn fault(&self) -> Option<String> {
        self.state.read().fault.clone()
    }

    /// The result value, present only after a successful execution that
    /// produced one.
    pub fn result(&self) -> Option<JobValue> {
        self.state.read().result.clone()
    }

    /// Current lifecycle status, derived from the stamped timestamps.
    pub fn status(&self) -> JobStatus {
        self.state.read().status()
    }

    /// `true` once the record has a completion stamp strictly older than
    /// `cutoff`; the retention sweep uses this.
    pub(crate) fn completed_before(&self, cutoff: SystemTime) -> bool {
        match self.state.read().completed_at {
            Some(t) => t < cutoff,
            None => false,
        }
    }

    /// The deferred work to execute.
    pub(crate) fn work(&self) -> &JobRef {
        &self.work
    }

    /// Stamps the start of execution. Dispatcher only.
    pub(crate) fn mark_started(&self) {
        self.state.write().started_at = Some(SystemTime::now());
    }

    /// Stamps a successful completion. Dispatcher only.
    pub(crate) fn mark_completed(&self, elapsed: Duration, result: Option<JobValue>) {
        let mut state = self.state.write();
        state.completed_at = Some(SystemTime::now());
        state.execution_time = Some(elapsed);
        state.result = result;
    }

    /// Stamps a failed completion. Dispatcher only.
    pub(crate) fn mark_faulted(&self, elapsed: Duration, fault: String) {
        let mut state = self.state.write();
        state.completed_at = Some(SystemTime::now());
        state.execution_time = Some(elapsed);
        state.fault = Some(fault);
    }

    /// Shifts the completion stamp into the past, for retention tests.
    #[cfg(test)]
    pub(crate) fn backdate_completion(&self, by: Duration) {
        let mut state = self.state.write();
        if let Some(t) = state.completed_at {
            state.completed_at = t.checked_sub(by);
        }
    }
}

impl fmt::Debug for JobRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobRecord")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("status", &self.status())
            .finish()
    }
}

/// Compact query view: id plus derived status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessStatus {
    pub id: JobId,
    pub status: JobStatus,
}

impl ProcessStatus {
    pub(crate) fn from_record(record: &JobRecord) -> Self {
        Self {
            id: record.id.clone(),
            status: record.status(),
        }
    }
}

/// Detailed query view over one record.
///
/// All execution fields are `None` until the dispatcher stamps them; for an
/// unknown id the view carries the [`JobStatus::NotFound`] sentinel and
/// nothing else.
#[derive(Clone, Debug)]
pub struct ProcessDetail {
    pub id: JobId,
    pub status: JobStatus,
    pub started_at: Option<SystemTime>,
    pub completed_at: Option<SystemTime>,
    pub execution_time: Option<Duration>,
    pub fault: Option<String>,
    pub result: Option<JobValue>,
}

impl ProcessDetail {
    /// Builds the view under a single state read so the fields are mutually
    /// consistent.
    pub(crate) fn from_record(record: &JobRecord) -> Self {
        let state = record.state.read();
        Self {
            id: record.id.clone(),
            status: state.status(),
            started_at: state.started_at,
            completed_at: state.completed_at,
            execution_time: state.execution_time,
            fault: state.fault.clone(),
            result: state.result.clone(),
        }
    }

    /// The sentinel view for an unknown id.
    pub(crate) fn not_found(id: JobId) -> Self {
        Self {
            id,
            status: JobStatus::NotFound,
            started_at: None,
            completed_at: None,
            execution_time: None,
            fault: None,
            result: None,
        }
    }
}
