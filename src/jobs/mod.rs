//! # Job abstractions and records.
//!
//! This module provides the job-related types:
//! - [`Job`] - trait for implementing async cancelable units of work
//! - [`JobFn`] - function-backed job implementation
//! - [`JobRef`] - shared reference to a job (`Arc<dyn Job>`)
//! - [`JobRecord`] - a submitted job plus its lifecycle metadata
//! - [`JobId`], [`JobStatus`] - identity and derived lifecycle status
//! - [`ProcessStatus`], [`ProcessDetail`] - query views over a record

mod job;
mod job_fn;
mod record;

pub use job::{Job, JobOutput};
pub use job_fn::{JobFn, JobRef};
pub use record::{JobId, JobRecord, JobStatus, ProcessDetail, ProcessStatus};
