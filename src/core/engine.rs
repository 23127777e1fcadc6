//! # Engine: the public facade over queue, gate, and dispatch loop.
//!
//! The [`Engine`] owns the shared [`JobQueue`], the [`AdmissionGate`], and the
//! readiness barrier. Callers submit work and query lifecycle state through
//! it; exactly one dispatch loop per engine drives execution.
//!
//! ## Key responsibilities
//! - accept submissions and hand back generated [`JobId`]s
//! - answer status, detail, result, and log queries at any time
//! - gate callers on one-shot initialization via [`initialization_complete`]
//! - run the dispatch loop, at most one instance at a time
//!
//! ## High-level architecture
//! ```text
//! Callers:
//!   submit(label, work) ──► JobQueue::enqueue            (Planned)
//!   processes() / process_details(id) / task_result(id) / task_log()
//!   initialization_complete() ──► ReadyBarrier::wait     (one-shot)
//!
//! Execution (run(token)):
//!   Dispatcher loop ──► JobQueue::next_job ──► AdmissionGate ──► worker
//!                                                                  │
//!                         record stamps + result cache  ◄──────────┘
//!
//! Shutdown path:
//!   token.cancel() ──► loop exits ──► drain workers within grace
//!                                      └─ exceeded → GraceExceeded { stuck }
//! ```
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//!
//! use tokio_util::sync::CancellationToken;
//! use jobq::{Engine, EngineConfig, JobValue};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let mut cfg = EngineConfig::default();
//!     cfg.poll_interval = Duration::from_millis(10);
//!     cfg.idle_backoff = Duration::from_millis(10);
//!
//!     let engine = Engine::new(cfg);
//!     let id = engine.submit_fn("answer", |_ctx| async { Ok(Some(JobValue::new(42i32))) });
//!
//!     let token = CancellationToken::new();
//!     let loop_handle = {
//!         let engine = engine.clone();
//!         let token = token.clone();
//!         tokio::spawn(async move { engine.run(token).await })
//!     };
//!
//!     while engine.task_result::<i32>(&id).is_none() {
//!         tokio::time::sleep(Duration::from_millis(10)).await;
//!     }
//!     assert_eq!(engine.task_result::<i32>(&id), Some(42));
//!
//!     token.cancel();
//!     loop_handle.await.unwrap().unwrap();
//! }
//! ```
//!
//! [`initialization_complete`]: Engine::initialization_complete

use std::any::Any;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::core::{Dispatcher, InitFn, ReadyBarrier};
use crate::error::{EngineError, InitError};
use crate::gate::AdmissionGate;
use crate::jobs::{JobFn, JobId, JobOutput, JobRecord, JobRef, ProcessDetail, ProcessStatus};
use crate::queue::{JobQueue, LogEntry};

/// Accepts jobs, answers queries, and runs the dispatch loop.
///
/// Cheap to share: both [`Engine::new`] and [`EngineBuilder::build`] return
/// `Arc<Engine>`, so the same instance can submit from one task while
/// [`Engine::run`] drives execution on another. The queue and gate stay
/// internal; all interaction goes through this facade.
pub struct Engine {
    cfg: EngineConfig,
    queue: Arc<JobQueue>,
    gate: Arc<AdmissionGate>,
    ready: ReadyBarrier,
    running: AtomicBool,
}

impl Engine {
    /// Creates an engine with no initializer; readiness is immediate.
    pub fn new(cfg: EngineConfig) -> Arc<Self> {
        Engine::builder(cfg).build()
    }

    /// Starts a builder for an engine that needs a one-shot initializer.
    pub fn builder(cfg: EngineConfig) -> EngineBuilder {
        EngineBuilder { cfg, init: None }
    }

    /// Submits a job for background execution and returns its generated id.
    ///
    /// The job starts as `Planned`; a running dispatch loop picks it up on a
    /// later iteration. Submission itself never blocks and never fails.
    pub fn submit(&self, label: impl Into<String>, work: JobRef) -> JobId {
        let record = Arc::new(JobRecord::new(label, work));
        let id = record.id().clone();
        if !self.queue.enqueue(record) {
            // Ids are generated fresh per submission, so a duplicate means an
            // id collision rather than caller error.
            tracing::warn!(%id, "enqueue rejected a duplicate id");
        }
        id
    }

    /// Submits a closure as a job. Sugar over [`submit`] + [`JobFn`].
    ///
    /// [`submit`]: Engine::submit
    pub fn submit_fn<F, Fut>(&self, label: impl Into<String>, f: F) -> JobId
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = JobOutput> + Send + 'static,
    {
        self.submit(label, JobFn::arc(f))
    }

    /// Returns id plus derived status for every job the engine still knows:
    /// planned first, then the running registry.
    pub fn processes(&self) -> Vec<ProcessStatus> {
        self.queue
            .all()
            .iter()
            .map(|record| ProcessStatus::from_record(record))
            .collect()
    }

    /// Returns the full lifecycle detail for `id`.
    ///
    /// Unknown ids (never submitted, or already evicted by retention) yield a
    /// `NotFound` detail rather than an error.
    pub fn process_details(&self, id: &JobId) -> ProcessDetail {
        match self.queue.find(id) {
            Some(record) => ProcessDetail::from_record(&record),
            None => ProcessDetail::not_found(id.clone()),
        }
    }

    /// Resolves the cached result of `id` against the requested type.
    ///
    /// `None` covers every miss: unknown id, job not finished, job finished
    /// without a value, or a stored value of a different type. Never panics.
    pub fn task_result<T: Any + Clone>(&self, id: &JobId) -> Option<T> {
        self.queue.get_result(id).and_then(|value| value.get::<T>())
    }

    /// Snapshot of the queue's append-only log.
    pub fn task_log(&self) -> Vec<LogEntry> {
        self.queue.task_log()
    }

    /// Waits until one-shot initialization has completed.
    ///
    /// The first caller triggers the initializer under
    /// [`EngineConfig::init_timeout`]; every caller receives the same
    /// outcome. A fault, timeout, or panic in the initializer is re-raised
    /// to all of them as a cloned [`InitError`]. Returns `Ok(true)` once
    /// ready; with no initializer configured that is immediate.
    pub async fn initialization_complete(&self) -> Result<bool, InitError> {
        self.ready.wait().await
    }

    /// Runs the dispatch loop until `token` is cancelled.
    ///
    /// At most one loop per engine: a second concurrent call returns
    /// [`EngineError::AlreadyRunning`]. The slot frees when this call
    /// returns or its future is dropped, so the engine may be run again
    /// afterwards. On shutdown, in-flight workers get
    /// [`EngineConfig::grace`] to finish; exceeding it aborts them and
    /// returns [`EngineError::GraceExceeded`].
    pub async fn run(&self, token: CancellationToken) -> Result<(), EngineError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(EngineError::AlreadyRunning);
        }
        let _active = RunGuard::new(&self.running);

        let dispatcher = Dispatcher::new(
            self.cfg.clone(),
            Arc::clone(&self.queue),
            Arc::clone(&self.gate),
        );
        dispatcher.run(token).await
    }
}

/// Clears the engine's running flag on drop, so a dispatch future that is
/// dropped mid-loop cannot leave the engine stuck on `AlreadyRunning`.
struct RunGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn new(flag: &'a AtomicBool) -> Self {
        Self { flag }
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Builds an [`Engine`], optionally wiring a one-shot initializer.
pub struct EngineBuilder {
    cfg: EngineConfig,
    init: Option<InitFn>,
}

impl EngineBuilder {
    /// Sets the initializer the first readiness waiter will run.
    ///
    /// It executes at most once, bounded by [`EngineConfig::init_timeout`],
    /// and its outcome is replayed to every [`initialization_complete`]
    /// caller.
    ///
    /// [`initialization_complete`]: Engine::initialization_complete
    pub fn with_initializer<F, Fut>(mut self, f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), InitError>> + Send + 'static,
    {
        self.init = Some(Box::new(move || Box::pin(f())));
        self
    }

    /// Finishes construction.
    pub fn build(self) -> Arc<Engine> {
        let limit = self.cfg.concurrency_limit();
        Arc::new(Engine {
            ready: ReadyBarrier::new(self.cfg.init_timeout, self.init),
            queue: Arc::new(JobQueue::new()),
            gate: Arc::new(AdmissionGate::new(0, limit)),
            running: AtomicBool::new(false),
            cfg: self.cfg,
        })
    }
}
