//! # The job queue.
//!
//! [`JobQueue`] owns the four pieces of shared state and is their only
//! doorway:
//!
//! ```text
//!   planned:  Mutex<VecDeque<Arc<JobRecord>>>   FIFO of submitted work
//!   running:  DashMap<JobId, Arc<JobRecord>>    dequeued, executing or done
//!   results:  DashMap<JobId, JobValue>          cached values by job id
//!   log:      JobLog                            append-only trail
//! ```
//!
//! ## Rules
//! - A given id lives in at most one of {planned, running} at any instant;
//!   [`JobQueue::next_job`] moves the head under the planned lock so the
//!   duplicate check in [`JobQueue::enqueue`] can never race past it.
//! - `is_empty`/`len` report the planned FIFO only; running jobs are not
//!   "waiting".
//! - Eviction removes terminal records older than the retention cutoff from
//!   `running` and `results`; the log is never pruned.
//! - The FIFO mutex is held for scans and pops only; registry access is
//!   per-key, so unrelated submissions and queries do not serialize.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::jobs::{JobId, JobRecord};
use crate::queue::log::JobLog;
use crate::queue::value::JobValue;
use crate::queue::LogEntry;

/// Concurrent queue of planned work, running registry, result cache, and log.
pub struct JobQueue {
    planned: Mutex<VecDeque<Arc<JobRecord>>>,
    running: DashMap<JobId, Arc<JobRecord>>,
    results: DashMap<JobId, JobValue>,
    log: JobLog,
}

impl JobQueue {
    pub fn new() -> Self {
        Self {
            planned: Mutex::new(VecDeque::new()),
            running: DashMap::new(),
            results: DashMap::new(),
            log: JobLog::new(),
        }
    }

    /// Appends a record to the planned FIFO.
    ///
    /// Returns `false` (and logs a diagnostic against the id) if a record
    /// with the same id is already planned or running. Never panics.
    pub fn enqueue(&self, record: Arc<JobRecord>) -> bool {
        let mut planned = self.planned.lock();
        let duplicate = planned.iter().any(|r| r.id() == record.id())
            || self.running.contains_key(record.id());
        if duplicate {
            drop(planned);
            self.log.append(
                Some(record.id().clone()),
                "a job with this id already exists in the queue",
            );
            return false;
        }
        planned.push_back(record);
        true
    }

    /// Atomically removes the head of the planned FIFO and registers it as
    /// running. Returns `None` when nothing is planned.
    pub fn next_job(&self) -> Option<Arc<JobRecord>> {
        let mut planned = self.planned.lock();
        let record = planned.pop_front()?;
        // Insert under the planned lock: the id must never be absent from
        // both structures while enqueue's duplicate check can observe it.
        self.running.insert(record.id().clone(), record.clone());
        drop(planned);

        self.log.append(
            Some(record.id().clone()),
            format!("starting job {}", record.label()),
        );
        Some(record)
    }

    /// Snapshot of every planned then running record at the moment of the
    /// call; not a live view.
    pub fn all(&self) -> Vec<Arc<JobRecord>> {
        let mut out: Vec<Arc<JobRecord>> = self.planned.lock().iter().cloned().collect();
        // A record mid-move can sit in the planned snapshot and in `running`
        // at once; keep the first sighting of each id.
        let seen: HashSet<JobId> = out.iter().map(|r| r.id().clone()).collect();
        out.extend(
            self.running
                .iter()
                .filter(|entry| !seen.contains(entry.key()))
                .map(|entry| entry.value().clone()),
        );
        out
    }

    /// Point lookup by id: running registry first, then the planned FIFO.
    pub fn find(&self, id: &JobId) -> Option<Arc<JobRecord>> {
        if let Some(entry) = self.running.get(id) {
            return Some(entry.value().clone());
        }
        if let Some(record) = self.planned.lock().iter().find(|r| r.id() == id) {
            return Some(record.clone());
        }
        // next_job inserts into `running` before it releases the planned
        // lock, so a planned miss that raced the move is visible on a second
        // registry check.
        self.running.get(id).map(|entry| entry.value().clone())
    }

    /// Caches a result value for the id, logging its recorded type; with
    /// `None` it only logs that the job produced nothing.
    pub fn add_result(&self, id: &JobId, value: Option<JobValue>) {
        match value {
            Some(value) => {
                self.log.append(
                    Some(id.clone()),
                    format!("result of type {} added to task results", value.type_name()),
                );
                self.results.insert(id.clone(), value);
            }
            None => self.log.append(Some(id.clone()), "job produced no result"),
        }
    }

    /// Appends a log entry; `None` marks an engine-wide message. Never fails.
    pub fn add_log_entry(&self, id: Option<JobId>, message: impl Into<String>) {
        self.log.append(id, message);
    }

    /// The cached result for the id, if the job completed with one.
    pub fn get_result(&self, id: &JobId) -> Option<JobValue> {
        self.results.get(id).map(|entry| entry.value().clone())
    }

    /// `true` when no work is planned. Running jobs do not count.
    pub fn is_empty(&self) -> bool {
        self.planned.lock().is_empty()
    }

    /// Number of planned jobs waiting for dispatch.
    pub fn len(&self) -> usize {
        self.planned.lock().len()
    }

    /// Evicts terminal records whose completion stamp is strictly older than
    /// now minus `retention`, removing them from the running registry and the
    /// result cache. Returns the number of registry entries removed.
    ///
    /// Records never started, or started but unfinished, are untouched, so
    /// calling this twice with no new completions in between removes nothing
    /// the second time.
    pub fn clean_results(&self, retention: Duration) -> usize {
        let cutoff = match SystemTime::now().checked_sub(retention) {
            Some(t) => t,
            None => return 0,
        };

        let stale: Vec<JobId> = self
            .running
            .iter()
            .filter(|entry| entry.value().completed_before(cutoff))
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = 0;
        for id in stale {
            if let Some((_, record)) = self.running.remove(&id) {
                tracing::info!(job = %id, label = record.label(), "cleaning finished job");
                removed += 1;
            }
            if self.results.remove(&id).is_some() {
                tracing::debug!(job = %id, "cleaning cached result");
            }
        }
        removed
    }

    /// Snapshot of the diagnostic trail.
    pub fn task_log(&self) -> Vec<LogEntry> {
        self.log.snapshot()
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{JobFn, JobRef, JobStatus};

    fn noop_job() -> JobRef {
        JobFn::arc(|_ctx| async { Ok(None) })
    }

    fn record(label: &str) -> Arc<JobRecord> {
        Arc::new(JobRecord::new(label, noop_job()))
    }

    #[test]
    fn test_enqueue_rejects_duplicate_planned_id() {
        let queue = JobQueue::new();
        let rec = record("dup");

        assert!(queue.enqueue(rec.clone()));
        assert!(!queue.enqueue(rec.clone()));
        assert_eq!(queue.len(), 1);

        let log = queue.task_log();
        assert!(log
            .iter()
            .any(|e| e.job.as_ref() == Some(rec.id()) && e.message.contains("already exists")));
    }

    #[test]
    fn test_enqueue_rejects_id_already_running() {
        let queue = JobQueue::new();
        let rec = record("runner");
        assert!(queue.enqueue(rec.clone()));
        assert!(queue.next_job().is_some());

        assert!(!queue.enqueue(rec));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_next_job_is_fifo_and_moves_to_running() {
        let queue = JobQueue::new();
        let first = record("first");
        let second = record("second");
        queue.enqueue(first.clone());
        queue.enqueue(second.clone());

        let head = queue.next_job().unwrap();
        assert_eq!(head.id(), first.id());
        assert_eq!(queue.len(), 1);
        assert!(queue.find(first.id()).is_some());

        let log = queue.task_log();
        assert!(log.iter().any(|e| e.message == "starting job first"));
    }

    #[test]
    fn test_next_job_on_empty_queue() {
        let queue = JobQueue::new();
        assert!(queue.next_job().is_none());
    }

    #[test]
    fn test_all_snapshots_planned_then_running() {
        let queue = JobQueue::new();
        let a = record("a");
        let b = record("b");
        queue.enqueue(a.clone());
        queue.enqueue(b.clone());
        queue.next_job();

        let all = queue.all();
        assert_eq!(all.len(), 2);
        // Planned entries come first in the snapshot.
        assert_eq!(all[0].id(), b.id());
    }

    #[test]
    fn test_add_result_caches_and_logs_type() {
        let queue = JobQueue::new();
        let rec = record("calc");
        queue.enqueue(rec.clone());
        queue.next_job();

        queue.add_result(rec.id(), Some(JobValue::new(42i32)));
        let cached = queue.get_result(rec.id()).unwrap();
        assert_eq!(cached.get::<i32>(), Some(42));

        assert!(queue
            .task_log()
            .iter()
            .any(|e| e.message.contains("result of type i32")));
    }

    #[test]
    fn test_add_result_without_value_only_logs() {
        let queue = JobQueue::new();
        let rec = record("silent");
        queue.enqueue(rec.clone());
        queue.next_job();

        queue.add_result(rec.id(), None);
        assert!(queue.get_result(rec.id()).is_none());
        assert!(queue
            .task_log()
            .iter()
            .any(|e| e.message == "job produced no result"));
    }

    #[test]
    fn test_get_result_for_unknown_id() {
        let queue = JobQueue::new();
        assert!(queue.get_result(&JobId::new()).is_none());
    }

    #[test]
    fn test_len_counts_planned_only() {
        let queue = JobQueue::new();
        queue.enqueue(record("one"));
        queue.enqueue(record("two"));
        assert_eq!(queue.len(), 2);

        queue.next_job();
        assert_eq!(queue.len(), 1);
        assert!(!queue.is_empty());

        queue.next_job();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_clean_removes_exactly_the_stale_and_is_idempotent() {
        let queue = JobQueue::new();
        let fresh = record("fresh");
        let stale = record("stale");
        for rec in [&fresh, &stale] {
            queue.enqueue(rec.clone());
            queue.next_job();
            rec.mark_started();
            rec.mark_completed(Duration::from_millis(1), Some(JobValue::new(1u8)));
            queue.add_result(rec.id(), Some(JobValue::new(1u8)));
        }

        // Both just completed: the retention window keeps them.
        assert_eq!(queue.clean_results(Duration::from_secs(60)), 0);

        stale.backdate_completion(Duration::from_secs(61));
        assert_eq!(queue.clean_results(Duration::from_secs(60)), 1);
        assert!(queue.find(stale.id()).is_none());
        assert!(queue.get_result(stale.id()).is_none());
        assert!(queue.find(fresh.id()).is_some());
        assert!(queue.get_result(fresh.id()).is_some());

        // No new completions: the second sweep is a no-op.
        assert_eq!(queue.clean_results(Duration::from_secs(60)), 0);
    }

    #[test]
    fn test_clean_never_touches_unfinished_jobs() {
        let queue = JobQueue::new();
        let planned = record("planned");
        let started = record("started");
        queue.enqueue(started.clone());
        queue.enqueue(planned.clone());
        // The head (`started`) moves to running; `planned` stays queued.
        queue.next_job();
        started.mark_started();

        assert_eq!(queue.clean_results(Duration::ZERO), 0);
        assert_eq!(queue.all().len(), 2);
        assert_eq!(started.status(), JobStatus::Started);
    }

    #[test]
    fn test_find_checks_running_then_planned() {
        let queue = JobQueue::new();
        let waiting = record("waiting");
        let active = record("active");
        queue.enqueue(active.clone());
        queue.enqueue(waiting.clone());
        queue.next_job();

        assert_eq!(queue.find(active.id()).unwrap().id(), active.id());
        assert_eq!(queue.find(waiting.id()).unwrap().id(), waiting.id());
        assert!(queue.find(&JobId::new()).is_none());
    }

    #[test]
    fn test_find_never_loses_a_job_mid_move() {
        let queue = Arc::new(JobQueue::new());
        for _ in 0..2_000 {
            let rec = record("hop");
            let id = rec.id().clone();
            assert!(queue.enqueue(rec));

            let hammer = {
                let queue = Arc::clone(&queue);
                let id = id.clone();
                std::thread::spawn(move || {
                    for _ in 0..32 {
                        assert!(queue.find(&id).is_some(), "lookup lost a live job");
                    }
                })
            };
            assert!(queue.next_job().is_some());
            hammer.join().unwrap();
        }
    }

    #[test]
    fn test_snapshot_counts_each_job_once_during_moves() {
        use std::sync::atomic::{AtomicBool, Ordering};

        const JOBS: usize = 400;
        let queue = Arc::new(JobQueue::new());
        for _ in 0..JOBS {
            assert!(queue.enqueue(record("snap")));
        }

        let done = Arc::new(AtomicBool::new(false));
        let sampler = {
            let queue = Arc::clone(&queue);
            let done = Arc::clone(&done);
            std::thread::spawn(move || {
                while !done.load(Ordering::SeqCst) {
                    let snapshot = queue.all();
                    let distinct: HashSet<JobId> =
                        snapshot.iter().map(|r| r.id().clone()).collect();
                    assert_eq!(
                        distinct.len(),
                        snapshot.len(),
                        "snapshot double-counted a job"
                    );
                    assert_eq!(snapshot.len(), JOBS);
                }
            })
        };

        while queue.next_job().is_some() {}
        done.store(true, Ordering::SeqCst);
        sampler.join().unwrap();
        assert_eq!(queue.all().len(), JOBS);
    }
}
