//! # Function-backed job (`JobFn`)
//!
//! [`JobFn`] wraps a closure `F: Fn(CancellationToken) -> Fut`, producing a
//! fresh future per execution. This avoids shared mutable state; if a closure
//! needs shared state, capture an `Arc<...>` explicitly.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use jobq::{JobFn, JobRef, JobValue};
//!
//! let job: JobRef = JobFn::arc(|ctx: CancellationToken| async move {
//!     if ctx.is_cancelled() {
//!         return Ok(None);
//!     }
//!     Ok(Some(JobValue::new("done".to_string())))
//! });
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::jobs::job::{Job, JobOutput};

/// Shared handle to a job.
pub type JobRef = Arc<dyn Job>;

/// Function-backed job implementation.
///
/// Wraps a closure that *creates* a new future per execution.
#[derive(Debug)]
pub struct JobFn<F> {
    f: F,
}

impl<F> JobFn<F> {
    /// Creates a new function-backed job.
    ///
    /// Prefer [`JobFn::arc`] when you immediately need a [`JobRef`].
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the job and returns it as a shared handle (`Arc<dyn Job>`).
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Job for JobFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = JobOutput> + Send + 'static,
{
    async fn run(&self, ctx: CancellationToken) -> JobOutput {
        (self.f)(ctx).await
    }
}
