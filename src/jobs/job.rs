//! # Job abstraction.
//!
//! This module defines the [`Job`] trait (async, cancelable). The common
//! handle type is [`JobRef`](crate::jobs::JobRef), an `Arc<dyn Job>` suitable
//! for sharing between the queue and the dispatcher.
//!
//! A job receives a [`CancellationToken`] and should periodically check it to
//! stop cooperatively during shutdown. The engine never drops a running job
//! future mid-flight; a job that ignores the token simply keeps running.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::JobError;
use crate::queue::JobValue;

/// What a job execution produces.
///
/// `Ok(Some(value))` caches the value for typed retrieval; `Ok(None)` marks
/// the job completed without a result; `Err` marks it faulted.
pub type JobOutput = Result<Option<JobValue>, JobError>;

/// # Asynchronous, cancelable unit of work.
///
/// A `Job` has an async [`run`](Job::run) method that receives a
/// [`CancellationToken`]. Implementors should regularly check cancellation
/// and exit promptly during shutdown; returning [`JobError::Canceled`] marks
/// the record faulted with a distinguishable message, while returning
/// `Ok(None)` counts as a normal completion.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use async_trait::async_trait;
/// use jobq::{Job, JobOutput, JobValue};
///
/// struct Answer;
///
/// #[async_trait]
/// impl Job for Answer {
///     async fn run(&self, ctx: CancellationToken) -> JobOutput {
///         if ctx.is_cancelled() {
///             return Ok(None);
///         }
///         Ok(Some(JobValue::new(42i32)))
///     }
/// }
/// ```
#[async_trait]
pub trait Job: Send + Sync + 'static {
    /// Executes the job until completion or cooperative cancellation.
    async fn run(&self, ctx: CancellationToken) -> JobOutput;
}
