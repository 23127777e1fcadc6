//! Error types used by the engine and by job executions.
//!
//! This module defines three error enums:
//!
//! - [`EngineError`] — errors raised by the dispatch machinery itself.
//! - [`JobError`] — errors raised by individual job executions.
//! - [`InitError`] — errors raised by the one-shot readiness initializer.
//!
//! [`EngineError`] and [`JobError`] provide helper methods (`as_label`,
//! `as_message`) for logging. [`InitError`] is `Clone` because the readiness
//! barrier caches one outcome and re-raises it to every caller.

use std::time::Duration;
use thiserror::Error;

use crate::jobs::JobId;

/// # Errors produced by the dispatch machinery.
///
/// These represent failures of the engine itself, not of any single job.
/// Per-job faults never surface here; they are recorded on the job's record
/// and in the queue log.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum EngineError {
    /// A dispatch loop is already running for this engine.
    #[error("dispatcher is already running")]
    AlreadyRunning,

    /// Shutdown grace period was exceeded; some workers remained stuck and
    /// their futures were aborted.
    #[error("shutdown grace {grace:?} exceeded; stuck jobs: {stuck:?}; aborting workers")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Ids of jobs that were still executing when the grace expired.
        stuck: Vec<JobId>,
    },
}

impl EngineError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use jobq::EngineError;
    ///
    /// assert_eq!(EngineError::AlreadyRunning.as_label(), "engine_already_running");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            EngineError::AlreadyRunning => "engine_already_running",
            EngineError::GraceExceeded { .. } => "engine_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            EngineError::AlreadyRunning => "dispatcher is already running".to_string(),
            EngineError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck jobs={stuck:?}")
            }
        }
    }
}

/// # Errors produced by job execution.
///
/// A job body reports failure by returning one of these; the dispatcher
/// records the message on the job's record, appends it to the queue log, and
/// keeps the fault isolated from sibling jobs and from the loop. Panics
/// inside a job body are caught at the same boundary and recorded the same
/// way.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum JobError {
    /// Job execution failed.
    #[error("execution failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// Job observed the shutdown signal and stopped before finishing.
    #[error("job canceled")]
    Canceled,
}

impl JobError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use jobq::JobError;
    ///
    /// let err = JobError::Failed { error: "boom".into() };
    /// assert_eq!(err.as_label(), "job_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            JobError::Failed { .. } => "job_failed",
            JobError::Canceled => "job_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            JobError::Failed { error } => format!("error: {error}"),
            JobError::Canceled => "job canceled".to_string(),
        }
    }
}

/// # Errors produced by the one-shot readiness initializer.
///
/// The readiness barrier runs its initializer once, caches the outcome, and
/// replays it to every caller, current and future; `Clone` makes the replay
/// possible.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum InitError {
    /// The initializer did not finish within its bound.
    #[error("initialization timed out after {timeout:?}")]
    Timeout {
        /// The timeout that was exceeded.
        timeout: Duration,
    },

    /// The initializer reported failure or panicked.
    #[error("initialization failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },
}

impl InitError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            InitError::Timeout { .. } => "init_timeout",
            InitError::Failed { .. } => "init_failed",
        }
    }
}
