//! # Job queue: planned FIFO, running registry, result cache, and log.
//!
//! This module groups the engine's shared state:
//! - [`JobQueue`] - the single source of truth for planned work, in-flight
//!   work, and completed results
//! - [`JobValue`] - tagged container for typed result storage and retrieval
//! - [`LogEntry`] - one appended diagnostic line, job-scoped or engine-wide
//!
//! All mutating operations are safe under unbounded concurrent callers; the
//! registries use per-key locking and the FIFO sits behind its own short-held
//! mutex, so queries never stall on in-flight job execution.

mod core;
mod log;
mod value;

pub use self::core::JobQueue;
pub use self::log::LogEntry;
pub use self::value::JobValue;

pub(crate) use self::log::JobLog;
