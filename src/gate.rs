//! # Bounded admission.
//!
//! [`AdmissionGate`] limits how many jobs execute simultaneously. It is a
//! thin wrapper over `tokio::sync::Semaphore` that keeps the original
//! count-based surface (`wait_one`/`release` plus introspection) while
//! enforcing the bound strictly: the semaphore commits a reservation before
//! any count moves, so concurrent callers can never transiently exceed
//! capacity.
//!
//! ## Invariants
//! - `0 <= in_flight <= capacity` at all times.
//! - `wait_one` resolves as soon as a slot frees, never later than its
//!   timeout.
//! - `release` saturates: surplus releases are ignored rather than minting
//!   capacity beyond the configured maximum.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time;

/// Bounded-concurrency primitive limiting simultaneous job executions.
///
/// # Example
/// ```
/// use jobq::AdmissionGate;
///
/// let gate = AdmissionGate::new(0, 3);
/// assert_eq!(gate.capacity(), 3);
/// assert_eq!(gate.in_flight(), 0);
/// assert!(gate.has_capacity());
/// ```
pub struct AdmissionGate {
    slots: Semaphore,
    in_flight: AtomicUsize,
    capacity: usize,
}

impl AdmissionGate {
    /// Creates a gate with `initial` slots already considered occupied and a
    /// fixed maximum `capacity`.
    ///
    /// # Panics
    /// Panics if `capacity` does not exceed `initial`; a gate that starts
    /// full (or overfull) could never admit anything.
    pub fn new(initial: usize, capacity: usize) -> Self {
        assert!(
            capacity > initial,
            "capacity ({capacity}) must exceed the initial count ({initial})"
        );
        Self {
            slots: Semaphore::new(capacity - initial),
            in_flight: AtomicUsize::new(initial),
            capacity,
        }
    }

    /// Reserves one slot, waiting up to `timeout`.
    ///
    /// Returns `true` on success; the caller owes one [`release`] per
    /// successful wait. Returns `false` if no slot freed within `timeout`.
    ///
    /// [`release`]: AdmissionGate::release
    pub async fn wait_one(&self, timeout: Duration) -> bool {
        match time::timeout(timeout, self.slots.acquire()).await {
            Ok(Ok(permit)) => {
                // The slot stays reserved until release(); the permit object
                // itself is not kept.
                permit.forget();
                self.in_flight.fetch_add(1, Ordering::SeqCst);
                true
            }
            Ok(Err(_)) | Err(_) => false,
        }
    }

    /// Returns one slot.
    ///
    /// Saturates at zero: a release without a matching successful `wait_one`
    /// is ignored, so the effective capacity can never grow past the
    /// configured maximum.
    pub fn release(&self) {
        let mut current = self.in_flight.load(Ordering::SeqCst);
        loop {
            if current == 0 {
                return;
            }
            match self.in_flight.compare_exchange(
                current,
                current - 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => {
                    self.slots.add_permits(1);
                    return;
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Number of slots currently reserved.
    #[inline]
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// The fixed maximum number of simultaneous reservations.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// `true` while at least one slot is free.
    #[inline]
    pub fn has_capacity(&self) -> bool {
        self.slots.available_permits() > 0
    }
}

/// Releases one gate slot on drop, so a worker's slot is returned even if
/// the code between admission and completion panics.
pub(crate) struct SlotGuard<'a> {
    gate: &'a AdmissionGate,
}

impl<'a> SlotGuard<'a> {
    pub(crate) fn new(gate: &'a AdmissionGate) -> Self {
        Self { gate }
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        self.gate.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_admits_up_to_capacity() {
        let gate = AdmissionGate::new(0, 2);
        assert!(gate.wait_one(Duration::from_millis(10)).await);
        assert!(gate.wait_one(Duration::from_millis(10)).await);
        assert_eq!(gate.in_flight(), 2);
        assert!(!gate.has_capacity());
        assert!(!gate.wait_one(Duration::from_millis(50)).await);
    }

    #[tokio::test]
    async fn test_release_frees_a_waiter() {
        let gate = Arc::new(AdmissionGate::new(0, 1));
        assert!(gate.wait_one(Duration::from_millis(10)).await);

        let waiter = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move { gate.wait_one(Duration::from_secs(5)).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        gate.release();

        assert!(waiter.await.unwrap());
        assert_eq!(gate.in_flight(), 1);
    }

    #[tokio::test]
    async fn test_bound_holds_under_contention() {
        const CAPACITY: usize = 2;
        const CALLERS: usize = 16;

        let gate = Arc::new(AdmissionGate::new(0, CAPACITY));
        let holding = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..CALLERS {
            let gate = Arc::clone(&gate);
            let holding = Arc::clone(&holding);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                assert!(gate.wait_one(Duration::from_secs(10)).await);
                let now = holding.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                holding.fetch_sub(1, Ordering::SeqCst);
                gate.release();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= CAPACITY);
        assert_eq!(gate.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_surplus_release_is_ignored() {
        let gate = AdmissionGate::new(0, 2);
        gate.release();
        gate.release();
        assert_eq!(gate.in_flight(), 0);

        // The surplus releases must not have minted extra slots.
        assert!(gate.wait_one(Duration::from_millis(10)).await);
        assert!(gate.wait_one(Duration::from_millis(10)).await);
        assert!(!gate.wait_one(Duration::from_millis(30)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_one_timeout_expires_on_the_virtual_clock() {
        let gate = AdmissionGate::new(0, 1);
        assert!(gate.wait_one(Duration::from_millis(10)).await);

        // Nothing releases, so the five second wait runs entirely on the
        // paused clock and lands exactly on its deadline.
        let started = tokio::time::Instant::now();
        assert!(!gate.wait_one(Duration::from_secs(5)).await);
        assert_eq!(started.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_initial_count_occupies_slots() {
        let gate = AdmissionGate::new(1, 2);
        assert_eq!(gate.in_flight(), 1);
        assert!(gate.wait_one(Duration::from_millis(10)).await);
        assert!(!gate.wait_one(Duration::from_millis(30)).await);

        gate.release();
        gate.release();
        assert_eq!(gate.in_flight(), 0);
    }

    #[test]
    #[should_panic(expected = "must exceed")]
    fn test_capacity_must_exceed_initial() {
        let _ = AdmissionGate::new(2, 2);
    }

    #[tokio::test]
    async fn test_slot_guard_releases_on_drop() {
        let gate = AdmissionGate::new(0, 1);
        assert!(gate.wait_one(Duration::from_millis(10)).await);
        {
            let _guard = SlotGuard::new(&gate);
        }
        assert_eq!(gate.in_flight(), 0);
        assert!(gate.has_capacity());
    }
}
