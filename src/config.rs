//! # Engine configuration.
//!
//! Provides [`EngineConfig`], the centralized settings for the dispatch loop,
//! the admission gate, result retention, and the readiness barrier.
//!
//! All fields are public for flexibility; prefer the helper accessors where a
//! field carries a clamp (`concurrency_limit`) to avoid sprinkling sentinel
//! checks across the codebase.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use jobq::EngineConfig;
//!
//! let mut cfg = EngineConfig::default();
//! cfg.max_concurrent = 2;
//! cfg.retention = Duration::from_secs(30);
//!
//! assert_eq!(cfg.concurrency_limit(), 2);
//! ```

use std::time::Duration;

/// Configuration for the job engine.
///
/// Defines:
/// - **Concurrency**: how many jobs may execute simultaneously
/// - **Loop cadence**: poll interval while busy, backoff while idle
/// - **Admission**: how long a worker waits for a free slot
/// - **Retention**: how long finished jobs and their results are kept
/// - **Readiness**: the initializer timeout
/// - **Shutdown**: grace period for draining in-flight workers
///
/// ## Field semantics
/// - `max_concurrent`: admission capacity; `0` is clamped to `1` (the engine
///   is always bounded)
/// - `poll_interval`: sleep between loop iterations
/// - `idle_backoff`: additional sleep when the queue is empty or the gate is
///   saturated
/// - `admission_timeout`: bound on a worker's wait for a slot; on expiry the
///   job stays planned and is retried on a later iteration
/// - `retention`: completed/faulted jobs older than this are evicted from the
///   running registry together with their cached results
/// - `init_timeout`: bound on the one-shot readiness initializer
/// - `grace`: maximum wait for in-flight workers after shutdown is requested
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Maximum number of jobs executing at the same time.
    ///
    /// `0` is treated as `1`; the admission gate always enforces a bound.
    pub max_concurrent: usize,

    /// Sleep between dispatch loop iterations.
    pub poll_interval: Duration,

    /// Additional sleep when there is nothing to dispatch.
    ///
    /// Taken when the planned queue is empty or every slot is occupied, so an
    /// idle engine does not spin at `poll_interval` cadence.
    pub idle_backoff: Duration,

    /// How long a dispatched worker waits for an admission slot before giving
    /// up; the job it would have claimed stays planned.
    pub admission_timeout: Duration,

    /// Retention window for finished jobs.
    ///
    /// Each loop iteration evicts jobs whose completion timestamp is older
    /// than now minus `retention`, along with their cached results. Jobs that
    /// never started, or started but have not finished, are never evicted.
    pub retention: Duration,

    /// Bound on the one-shot readiness initializer.
    ///
    /// If the initializer does not finish within this window, every caller of
    /// the readiness barrier receives `InitError::Timeout`.
    pub init_timeout: Duration,

    /// Maximum time to wait for in-flight workers to finish after shutdown
    /// is requested; leftover worker futures are aborted once it expires.
    pub grace: Duration,
}

impl EngineConfig {
    /// Returns the admission capacity, clamped to a minimum of 1.
    ///
    /// The gate must always enforce a bound; an accidental `0` would make the
    /// engine unable to execute anything.
    #[inline]
    pub fn concurrency_limit(&self) -> usize {
        self.max_concurrent.max(1)
    }
}

impl Default for EngineConfig {
    /// Default configuration:
    ///
    /// - `max_concurrent = 3`
    /// - `poll_interval = 100ms`
    /// - `idle_backoff = 5s`
    /// - `admission_timeout = 60s`
    /// - `retention = 60s`
    /// - `init_timeout = 5s`
    /// - `grace = 30s`
    fn default() -> Self {
        Self {
            max_concurrent: 3,
            poll_interval: Duration::from_millis(100),
            idle_backoff: Duration::from_secs(5),
            admission_timeout: Duration::from_secs(60),
            retention: Duration::from_secs(60),
            init_timeout: Duration::from_secs(5),
            grace: Duration::from_secs(30),
        }
    }
}
