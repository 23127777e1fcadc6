//! Engine core: dispatch, execution, readiness, and the public facade.
//!
//! The only public API from this module is [`Engine`] (with its builder),
//! which owns the queue, the admission gate, and the readiness barrier, and
//! drives the dispatch loop.
//!
//! Internal modules:
//! - [`dispatcher`]: the poll/admit/execute/evict loop with structured
//!   shutdown;
//! - [`runner`]: executes one admitted job and records its outcome;
//! - [`ready`]: the one-shot readiness barrier.

mod dispatcher;
mod engine;
mod ready;
mod runner;

pub use engine::{Engine, EngineBuilder};

pub(crate) use dispatcher::Dispatcher;
pub(crate) use ready::{InitFn, ReadyBarrier};
