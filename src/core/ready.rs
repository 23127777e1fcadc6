//! # Readiness barrier: one-shot initialization gating the engine.
//!
//! Callers of [`Engine::initialization_complete`] land here. The first waiter
//! launches the configured initializer on a detached task bounded by
//! [`EngineConfig::init_timeout`]; everyone else, concurrent or arriving
//! years later, awaits and receives the same cached outcome.
//!
//! ## Rules
//! - The initializer runs **at most once**. A fault, timeout, or panic is
//!   recorded and replayed; there is no retry path.
//! - The run is detached from its waiters. A caller that gives up and drops
//!   its wait mid-flight leaves the run untouched; readiness is reported
//!   only after the initializer actually finished.
//! - Panics inside the initializer are contained here and surface as
//!   [`InitError::Failed`].
//! - With no initializer configured the barrier reports ready immediately.
//!
//! [`Engine::initialization_complete`]: crate::Engine::initialization_complete
//! [`EngineConfig::init_timeout`]: crate::EngineConfig::init_timeout

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::time::Duration;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::time;

use crate::core::runner::panic_message;
use crate::error::InitError;

type InitFuture = Pin<Box<dyn Future<Output = Result<(), InitError>> + Send>>;

/// Boxed one-time initializer, launched by the first readiness waiter.
pub(crate) type InitFn = Box<dyn FnOnce() -> InitFuture + Send>;

/// Outcome future every waiter awaits a clone of.
type SharedOutcome = Shared<BoxFuture<'static, Result<(), InitError>>>;

enum ReadyState {
    /// No initializer was configured; the barrier is born ready.
    Ready,
    /// Initializer waiting for the first caller.
    Pending(InitFn),
    /// Initializer launched; every waiter shares the same outcome.
    Running(SharedOutcome),
}

/// Runs the initializer once and replays its outcome to every waiter.
pub(crate) struct ReadyBarrier {
    timeout: Duration,
    state: Mutex<ReadyState>,
}

impl ReadyBarrier {
    pub(crate) fn new(timeout: Duration, init: Option<InitFn>) -> Self {
        let state = match init {
            Some(init) => ReadyState::Pending(init),
            None => ReadyState::Ready,
        };
        Self {
            timeout,
            state: Mutex::new(state),
        }
    }

    /// Waits until initialization has run to completion.
    ///
    /// Returns `Ok(true)` once ready; re-raises the recorded [`InitError`]
    /// when the initializer faulted, timed out, or panicked.
    pub(crate) async fn wait(&self) -> Result<bool, InitError> {
        let shared = {
            let mut state = self.state.lock();
            match std::mem::replace(&mut *state, ReadyState::Ready) {
                ReadyState::Ready => return Ok(true),
                ReadyState::Pending(init) => {
                    let shared = self.launch(init);
                    *state = ReadyState::Running(shared.clone());
                    shared
                }
                ReadyState::Running(shared) => {
                    *state = ReadyState::Running(shared.clone());
                    shared
                }
            }
        };
        shared.await?;
        Ok(true)
    }

    /// Starts the initializer on a task of its own.
    ///
    /// The run is detached from the calling waiter: dropping a wait cannot
    /// abandon an initializer that already started, so the recorded outcome
    /// always reflects a run that finished, faulted, or hit the timeout.
    fn launch(&self, init: InitFn) -> SharedOutcome {
        tracing::info!("running engine initializer");
        let timeout = self.timeout;
        let worker = tokio::spawn(async move {
            // The factory is invoked inside the caught future so a panic
            // while *creating* the init future is contained as well.
            let guarded =
                AssertUnwindSafe(async move { time::timeout(timeout, init()).await }).catch_unwind();

            let outcome = match guarded.await {
                Ok(Ok(result)) => result,
                Ok(Err(_)) => Err(InitError::Timeout { timeout }),
                Err(panic) => Err(InitError::Failed {
                    error: panic_message(panic),
                }),
            };

            match &outcome {
                Ok(()) => tracing::info!("initialization complete"),
                Err(err) => tracing::error!(label = err.as_label(), "initialization failed: {err}"),
            }
            outcome
        });

        async move {
            match worker.await {
                Ok(outcome) => outcome,
                // The task contains its own panics; landing here means the
                // runtime tore it down before it could report.
                Err(_) => Err(InitError::Failed {
                    error: "initializer task aborted before completing".to_string(),
                }),
            }
        }
        .boxed()
        .shared()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn test_ready_immediately_without_initializer() {
        let barrier = ReadyBarrier::new(Duration::from_secs(1), None);
        assert!(matches!(barrier.wait().await, Ok(true)));
        assert!(matches!(barrier.wait().await, Ok(true)));
    }

    #[tokio::test]
    async fn test_initializer_runs_once_for_concurrent_waiters() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let init: InitFn = Box::new(move || {
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                time::sleep(Duration::from_millis(20)).await;
                Ok(())
            })
        });

        let barrier = Arc::new(ReadyBarrier::new(Duration::from_secs(1), Some(init)));
        let mut waiters = Vec::new();
        for _ in 0..8 {
            let barrier = barrier.clone();
            waiters.push(tokio::spawn(async move { barrier.wait().await }));
        }
        for waiter in waiters {
            assert!(matches!(waiter.await.unwrap(), Ok(true)));
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_abandoned_waiter_cannot_fake_readiness() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let init: InitFn = Box::new(move || {
            Box::pin(async move {
                time::sleep(Duration::from_millis(200)).await;
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        });
        let barrier = ReadyBarrier::new(Duration::from_secs(5), Some(init));

        // The first caller gives up long before the initializer finishes.
        let abandoned = time::timeout(Duration::from_millis(50), barrier.wait()).await;
        assert!(abandoned.is_err());
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        // The run kept going detached; readiness arrives only once the
        // initializer actually completed, never from the dropped wait.
        assert!(matches!(barrier.wait().await, Ok(true)));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_is_recorded_and_replayed() {
        let init: InitFn = Box::new(|| {
            Box::pin(async {
                time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
        });
        let barrier = ReadyBarrier::new(Duration::from_millis(20), Some(init));

        let first = barrier.wait().await;
        assert!(matches!(first, Err(InitError::Timeout { .. })));

        // The second wait replays the cached outcome instead of re-running
        // the (one minute long) initializer.
        let started = std::time::Instant::now();
        let second = barrier.wait().await;
        assert!(matches!(second, Err(InitError::Timeout { .. })));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_failure_is_recorded_and_replayed() {
        let init: InitFn = Box::new(|| {
            Box::pin(async {
                Err(InitError::Failed {
                    error: "warmup refused".into(),
                })
            })
        });
        let barrier = ReadyBarrier::new(Duration::from_secs(1), Some(init));

        for _ in 0..2 {
            match barrier.wait().await {
                Err(InitError::Failed { error }) => assert_eq!(error, "warmup refused"),
                other => panic!("expected Failed, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_panicking_initializer_surfaces_as_failed() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let init: InitFn = Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            panic!("warmup exploded")
        });
        let barrier = ReadyBarrier::new(Duration::from_secs(1), Some(init));

        for _ in 0..2 {
            match barrier.wait().await {
                Err(InitError::Failed { error }) => assert!(error.contains("warmup exploded")),
                other => panic!("expected Failed, got {other:?}"),
            }
        }
        // The panic was contained inside the one launched run; nothing ran
        // twice.
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
