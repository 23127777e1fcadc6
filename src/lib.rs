//! # jobq
//!
//! **jobq** is an in-process background job engine for Rust.
//!
//! Callers submit async jobs and immediately get an id back; a bounded
//! dispatch loop executes them in the background while the id answers status,
//! detail, and typed-result queries at any time. The crate is designed as a
//! building block for services that need "fire, then poll" work execution
//! without an external queue.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  callers                               Engine (facade)
//!    │ submit(label, work) ─► JobId        │ processes() / process_details(id)
//!    │                                     │ task_result::<T>(id) / task_log()
//!    ▼                                     │ initialization_complete()
//! ┌─────────────────────────────────────────────────────────┐
//! │ JobQueue (shared state)                                 │
//! │   planned FIFO ──► running registry ──► result cache    │
//! │   log: append-only, engine-wide and per-job entries     │
//! └──────┬─────────────────────────────────▲────────────────┘
//!        │ next_job()                      │ stamps / results
//!        ▼                                 │
//! ┌──────────────┐   wait_one(timeout) ┌───────────────┐
//! │  Dispatcher  │ ──────────────────► │ AdmissionGate │
//! │  (poll loop) │                     │ (≤ capacity)  │
//! └──────┬───────┘                     └───────────────┘
//!        │ spawn (one worker per admitted job)
//!        ▼
//!     workers ──► run the job ──► record outcome, release the slot
//! ```
//!
//! ### Lifecycle
//! ```text
//! submit ──► Planned ──► Started ──► Completed ──┐
//!                          │                     ├─► retention expiry ──► evicted
//!                          └──► Faulted ─────────┘         (queries: NotFound)
//!
//! - faults and panics are contained per job; siblings and the loop continue
//! - cancellation is cooperative: jobs receive a token, futures are never
//!   dropped mid-flight (only the post-grace abort on shutdown)
//! ```
//!
//! ## Features
//! | Area                  | Description                                                      | Key types / traits                          |
//! |-----------------------|------------------------------------------------------------------|---------------------------------------------|
//! | **Submission**        | Queue async work for background execution, get an id back.       | [`Engine`], [`Job`], [`JobFn`]              |
//! | **Queries**           | Status, full detail, typed results, and the log, at any time.    | [`ProcessStatus`], [`ProcessDetail`], [`JobValue`] |
//! | **Bounded execution** | A strict admission gate caps concurrently running jobs.          | [`AdmissionGate`], [`EngineConfig`]         |
//! | **Retention**         | Finished jobs and cached results are evicted after a TTL.        | [`EngineConfig::retention`]                 |
//! | **Readiness**         | One-shot initialization barrier in front of the engine.          | [`Engine::initialization_complete`]         |
//! | **Errors**            | Typed errors for the engine, job bodies, and initialization.     | [`EngineError`], [`JobError`], [`InitError`] |
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//!
//! use tokio_util::sync::CancellationToken;
//! use jobq::{Engine, EngineConfig, JobValue};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = EngineConfig::default();
//!     cfg.max_concurrent = 2;
//!     cfg.poll_interval = Duration::from_millis(10);
//!     cfg.idle_backoff = Duration::from_millis(10);
//!
//!     // One-shot warmup; every initialization_complete() caller gets its outcome.
//!     let engine = Engine::builder(cfg)
//!         .with_initializer(|| async { Ok(()) })
//!         .build();
//!
//!     let token = CancellationToken::new();
//!     let loop_handle = {
//!         let engine = engine.clone();
//!         let token = token.clone();
//!         tokio::spawn(async move { engine.run(token).await })
//!     };
//!
//!     engine.initialization_complete().await?;
//!
//!     let id = engine.submit_fn("answer", |_ctx| async { Ok(Some(JobValue::new(42i32))) });
//!     while engine.task_result::<i32>(&id).is_none() {
//!         tokio::time::sleep(Duration::from_millis(10)).await;
//!     }
//!     assert_eq!(engine.task_result::<i32>(&id), Some(42));
//!
//!     token.cancel();
//!     loop_handle.await??;
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod gate;
mod jobs;
mod queue;

// ---- Public re-exports ----

pub use crate::config::EngineConfig;
pub use crate::core::{Engine, EngineBuilder};
pub use crate::error::{EngineError, InitError, JobError};
pub use crate::gate::AdmissionGate;
pub use crate::jobs::{
    Job, JobFn, JobId, JobOutput, JobRecord, JobRef, JobStatus, ProcessDetail, ProcessStatus,
};
pub use crate::queue::{JobQueue, JobValue, LogEntry};
