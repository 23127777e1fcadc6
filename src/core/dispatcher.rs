//! # Dispatcher: the polling loop that moves planned jobs into execution.
//!
//! The [`Dispatcher`] owns nothing the rest of the engine cannot see: it
//! borrows the shared [`JobQueue`] and [`AdmissionGate`] and drives them on a
//! fixed cadence until its token is cancelled.
//!
//! ## Loop shape
//! ```text
//! while !cancelled:
//!   - reap finished workers (non-blocking)
//!   - queue non-empty AND gate has a free slot?
//!       yes → spawn worker: wait_one(admission_timeout) → next_job() → run
//!       no  → log idle diagnostics, sleep idle_backoff (cancellable)
//!   - clean_results(retention), log the count when non-zero
//!   - sleep poll_interval (cancellable)
//!
//! on cancel:
//!   - stop spawning, wait up to `grace` for in-flight workers
//!   - grace exceeded → abort remaining workers, report the stuck job ids
//! ```
//!
//! ## Rules
//! - Each worker reserves its slot **before** dequeuing, so a job leaves the
//!   planned queue only when it can actually run.
//! - Workers never exceed `concurrency_limit()`; the gate blocks, it does not
//!   count optimistically.
//! - Cancellation reaches jobs through child tokens; the loop itself never
//!   drops a running job future. Only the post-grace abort does.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::core::runner;
use crate::error::EngineError;
use crate::gate::{AdmissionGate, SlotGuard};
use crate::jobs::{JobId, JobStatus};
use crate::queue::JobQueue;

/// Polls the queue, admits jobs through the gate, and supervises the workers
/// running them.
pub(crate) struct Dispatcher {
    cfg: EngineConfig,
    queue: Arc<JobQueue>,
    gate: Arc<AdmissionGate>,
}

impl Dispatcher {
    pub(crate) fn new(cfg: EngineConfig, queue: Arc<JobQueue>, gate: Arc<AdmissionGate>) -> Self {
        Self { cfg, queue, gate }
    }

    /// Runs the dispatch loop until `token` is cancelled, then drains
    /// in-flight workers within [`EngineConfig::grace`].
    pub(crate) async fn run(&self, token: CancellationToken) -> Result<(), EngineError> {
        tracing::info!(capacity = self.gate.capacity(), "dispatcher running");
        self.queue.add_log_entry(None, "dispatcher started");

        let mut workers: JoinSet<()> = JoinSet::new();
        while !token.is_cancelled() {
            // Reap whatever finished since the last pass; workers carry their
            // own outcome handling, so the result is not inspected here.
            while workers.try_join_next().is_some() {}

            if !self.queue.is_empty() && self.gate.has_capacity() {
                self.spawn_worker(&mut workers, &token);
            } else {
                self.log_idle();
                if Self::pause(&token, self.cfg.idle_backoff).await {
                    break;
                }
            }

            let cleaned = self.queue.clean_results(self.cfg.retention);
            if cleaned > 0 {
                tracing::info!(cleaned, "cleaned completed results");
            }

            if Self::pause(&token, self.cfg.poll_interval).await {
                break;
            }
        }

        self.queue.add_log_entry(None, "dispatcher stopping");
        self.drain(workers).await
    }

    /// Spawns one worker: reserve a slot, dequeue, execute.
    ///
    /// The slot wait happens inside the worker so the loop never blocks; a
    /// worker that cannot get a slot within `admission_timeout` gives up and
    /// leaves the job planned for a later pass.
    fn spawn_worker(&self, workers: &mut JoinSet<()>, token: &CancellationToken) {
        let queue = Arc::clone(&self.queue);
        let gate = Arc::clone(&self.gate);
        let ctx = token.child_token();
        let wait = self.cfg.admission_timeout;

        workers.spawn(async move {
            if !gate.wait_one(wait).await {
                tracing::warn!("admission wait timed out, job stays planned");
                return;
            }
            let _slot = SlotGuard::new(&gate);
            tracing::debug!(in_flight = gate.in_flight(), "worker admitted");

            match queue.next_job() {
                Some(record) => runner::run_job(&queue, &record, ctx).await,
                // Another worker won the dequeue between the loop's check and
                // this one; the reserved slot is simply returned.
                None => tracing::debug!("queue drained before dequeue"),
            }
        });
    }

    /// Emits the idle diagnostics: what is waiting and what is executing.
    fn log_idle(&self) {
        let waiting = self.queue.len();
        if waiting == 0 {
            tracing::debug!("queue is empty, waiting for jobs");
        } else {
            tracing::debug!(waiting, "jobs waiting for a free slot");
        }

        let active = self.gate.in_flight();
        if active > 0 {
            tracing::debug!(active, capacity = self.gate.capacity(), "jobs executing");
        } else {
            tracing::debug!("no active jobs");
        }
    }

    /// Sleeps for `dur` unless the token fires first. Returns `true` when the
    /// sleep was interrupted by cancellation.
    async fn pause(token: &CancellationToken, dur: Duration) -> bool {
        tokio::select! {
            _ = token.cancelled() => true,
            _ = time::sleep(dur) => false,
        }
    }

    /// Waits for in-flight workers to finish within the configured grace
    /// period; aborts whatever remains and reports those jobs as stuck.
    async fn drain(&self, mut workers: JoinSet<()>) -> Result<(), EngineError> {
        if workers.is_empty() {
            return Ok(());
        }

        let grace = self.cfg.grace;
        let done = async { while workers.join_next().await.is_some() {} };
        let timed = time::timeout(grace, done).await;

        match timed {
            Ok(_) => {
                tracing::info!("all workers drained");
                Ok(())
            }
            Err(_) => {
                let stuck: Vec<JobId> = self
                    .queue
                    .all()
                    .iter()
                    .filter(|record| record.status() == JobStatus::Started)
                    .map(|record| record.id().clone())
                    .collect();
                tracing::warn!(stuck = stuck.len(), "grace exceeded, aborting workers");
                workers.abort_all();
                Err(EngineError::GraceExceeded { grace, stuck })
            }
        }
    }
}
