//! # Run a single admitted job.
//!
//! Executes one job end to end: stamps the start, awaits the work with panic
//! containment, measures wall-clock duration, and records the outcome on the
//! record and in the queue.
//!
//! ## Outcome flow
//!
//! ```text
//! Success:
//!   work.run() → Ok(value)  → queue.add_result + mark_completed
//!
//! Failure:
//!   work.run() → Err(e)     → queue.add_log_entry(fault) + mark_faulted
//!
//! Panic:
//!   work.run() → panic      → caught, logged, mark_faulted
//! ```
//!
//! ## Rules
//! - The work future is awaited to completion; cancellation is cooperative
//!   through the token the job received, never by dropping the future.
//! - Faults and panics are contained here; nothing escapes to the dispatch
//!   loop or to sibling jobs.
//! - Exactly one terminal stamp per execution: `mark_completed` or
//!   `mark_faulted`.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::jobs::JobRecord;
use crate::queue::JobQueue;

/// Executes `record`'s work and stamps the outcome.
pub(crate) async fn run_job(queue: &JobQueue, record: &Arc<JobRecord>, ctx: CancellationToken) {
    record.mark_started();
    let started = Instant::now();

    let outcome = AssertUnwindSafe(record.work().run(ctx)).catch_unwind().await;
    let elapsed = started.elapsed();

    match outcome {
        Ok(Ok(value)) => {
            queue.add_result(record.id(), value.clone());
            record.mark_completed(elapsed, value);
            tracing::debug!(
                job = %record.id(),
                label = record.label(),
                elapsed_ms = elapsed.as_millis() as u64,
                "job completed"
            );
        }
        Ok(Err(err)) => {
            queue.add_log_entry(Some(record.id().clone()), err.to_string());
            record.mark_faulted(elapsed, err.to_string());
            tracing::warn!(
                job = %record.id(),
                label = record.label(),
                error = %err,
                "job faulted"
            );
        }
        Err(panic) => {
            let message = panic_message(panic);
            queue.add_log_entry(Some(record.id().clone()), message.clone());
            record.mark_faulted(elapsed, message);
            tracing::error!(job = %record.id(), label = record.label(), "job panicked");
        }
    }
}

/// Renders a caught panic payload into a fault message.
pub(crate) fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("job panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("job panicked: {s}")
    } else {
        "job panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JobError;
    use crate::jobs::{JobFn, JobStatus};
    use crate::queue::JobValue;

    #[tokio::test]
    async fn test_success_records_result_and_completion() {
        let queue = JobQueue::new();
        let record = Arc::new(JobRecord::new(
            "answer",
            JobFn::arc(|_ctx| async { Ok(Some(JobValue::new(42i32))) }),
        ));
        queue.enqueue(record.clone());
        queue.next_job();

        run_job(&queue, &record, CancellationToken::new()).await;

        assert_eq!(record.status(), JobStatus::Completed);
        assert_eq!(
            queue.get_result(record.id()).and_then(|v| v.get::<i32>()),
            Some(42)
        );
        assert!(record.execution_time().is_some());
    }

    #[tokio::test]
    async fn test_error_is_logged_and_faults_the_record() {
        let queue = JobQueue::new();
        let record = Arc::new(JobRecord::new(
            "broken",
            JobFn::arc(|_ctx| async {
                Err(JobError::Failed {
                    error: "disk on fire".into(),
                })
            }),
        ));
        queue.enqueue(record.clone());
        queue.next_job();

        run_job(&queue, &record, CancellationToken::new()).await;

        assert_eq!(record.status(), JobStatus::Faulted);
        assert!(record.fault().unwrap().contains("disk on fire"));
        assert!(queue.get_result(record.id()).is_none());
        assert!(queue
            .task_log()
            .iter()
            .any(|e| e.job.as_ref() == Some(record.id()) && e.message.contains("disk on fire")));
    }

    async fn explode(_ctx: CancellationToken) -> crate::jobs::JobOutput {
        panic!("unplugged")
    }

    #[tokio::test]
    async fn test_panic_is_contained_and_faults_the_record() {
        let queue = JobQueue::new();
        let record = Arc::new(JobRecord::new("kaboom", JobFn::arc(explode)));
        queue.enqueue(record.clone());
        queue.next_job();

        run_job(&queue, &record, CancellationToken::new()).await;

        assert_eq!(record.status(), JobStatus::Faulted);
        assert!(record.fault().unwrap().contains("unplugged"));
    }

    #[tokio::test]
    async fn test_no_result_job_completes_without_cache_entry() {
        let queue = JobQueue::new();
        let record = Arc::new(JobRecord::new(
            "quiet",
            JobFn::arc(|_ctx| async { Ok(None) }),
        ));
        queue.enqueue(record.clone());
        queue.next_job();

        run_job(&queue, &record, CancellationToken::new()).await;

        assert_eq!(record.status(), JobStatus::Completed);
        assert!(queue.get_result(record.id()).is_none());
    }
}
