//! Per-worker concurrency limiters.
//!
//! Each active worker gets one [`ConcurrencyLimiter`] sized to its effective
//! concurrency. A job holds a [`LimiterPermit`] for as long as it drives the
//! worker's stream; the permit returns its slot when dropped, so the slot is
//! released on completion, failure, panic and task abort alike.

use crate::error::{EngineError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use surveyor_core::WorkerId;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Bounded-parallelism gate for one worker.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    worker_id: WorkerId,
    capacity: usize,
    semaphore: Arc<Semaphore>,
}

impl ConcurrencyLimiter {
    /// Create a limiter with `capacity` slots (at least one).
    #[must_use]
    pub fn new(worker_id: WorkerId, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            worker_id,
            capacity,
            semaphore: Arc::new(Semaphore::new(capacity)),
        }
    }

    /// Wait for a free slot.
    ///
    /// # Errors
    /// Returns [`EngineError::LimiterClosed`] if the limiter has been closed.
    pub async fn acquire(&self) -> Result<LimiterPermit> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| EngineError::LimiterClosed {
                worker_id: self.worker_id.clone(),
            })?;

        Ok(LimiterPermit { _permit: permit })
    }

    /// Close the limiter; pending and future `acquire` calls fail.
    pub fn close(&self) {
        self.semaphore.close();
    }

    /// Whether the limiter has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }

    /// Currently free slots.
    #[must_use]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Total slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Worker this limiter gates.
    #[must_use]
    pub fn worker_id(&self) -> &WorkerId {
        &self.worker_id
    }
}

/// An occupied slot. Dropping it releases the slot.
#[derive(Debug)]
#[must_use = "the slot is released as soon as the permit is dropped"]
pub struct LimiterPermit {
    _permit: OwnedSemaphorePermit,
}

impl LimiterPermit {
    /// Release the slot explicitly.
    pub fn release(self) {
        drop(self);
    }
}

/// The limiters of one run, keyed by worker ID.
#[derive(Debug, Default)]
pub struct LimiterSet {
    limiters: HashMap<WorkerId, ConcurrencyLimiter>,
}

impl LimiterSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the limiter for `worker_id`.
    pub fn insert(&mut self, worker_id: WorkerId, capacity: usize) {
        self.limiters.insert(
            worker_id.clone(),
            ConcurrencyLimiter::new(worker_id, capacity),
        );
    }

    /// Limiter for `worker_id`, if that worker is active.
    #[must_use]
    pub fn get(&self, worker_id: &WorkerId) -> Option<&ConcurrencyLimiter> {
        self.limiters.get(worker_id)
    }

    /// Close every limiter.
    pub fn close_all(&self) {
        for limiter in self.limiters.values() {
            limiter.close();
        }
    }

    /// Number of limiters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.limiters.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.limiters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn worker_id() -> WorkerId {
        WorkerId::new("port/scan").expect("valid worker ID")
    }

    #[tokio::test]
    async fn test_acquire_and_release() {
        let limiter = ConcurrencyLimiter::new(worker_id(), 2);
        assert_eq!(limiter.capacity(), 2);

        let first = limiter.acquire().await.expect("first slot");
        let second = limiter.acquire().await.expect("second slot");
        assert_eq!(limiter.available(), 0);

        first.release();
        assert_eq!(limiter.available(), 1);
        drop(second);
        assert_eq!(limiter.available(), 2);
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let limiter = ConcurrencyLimiter::new(worker_id(), 0);
        assert_eq!(limiter.capacity(), 1);
        assert_eq!(limiter.available(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_one_serializes() {
        let limiter = ConcurrencyLimiter::new(worker_id(), 1);
        let held = limiter.acquire().await.expect("slot");

        let waiter = {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.acquire().await.map(LimiterPermit::release) })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(held);
        waiter
            .await
            .expect("waiter task")
            .expect("slot after release");
    }

    #[tokio::test]
    async fn test_closed_limiter_fails_waiters() {
        let limiter = ConcurrencyLimiter::new(worker_id(), 1);
        let _held = limiter.acquire().await.expect("slot");

        let waiter = {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.acquire().await.map(LimiterPermit::release) })
        };
        tokio::task::yield_now().await;

        limiter.close();
        assert!(limiter.is_closed());

        let result = waiter.await.expect("waiter task");
        assert!(matches!(result, Err(EngineError::LimiterClosed { .. })));
    }

    #[tokio::test]
    async fn test_aborted_holder_releases_slot() {
        let limiter = ConcurrencyLimiter::new(worker_id(), 1);

        let holder = {
            let limiter = limiter.clone();
            tokio::spawn(async move {
                let _permit = limiter.acquire().await.expect("slot");
                futures::future::pending::<()>().await;
            })
        };
        while limiter.available() != 0 {
            tokio::task::yield_now().await;
        }

        holder.abort();
        let _ = holder.await;
        assert_eq!(limiter.available(), 1);
    }

    #[test]
    fn test_limiter_set() {
        let mut set = LimiterSet::new();
        set.insert(worker_id(), 3);
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(&worker_id()).map(ConcurrencyLimiter::capacity), Some(3));

        set.close_all();
        assert!(set.get(&worker_id()).is_some_and(ConcurrencyLimiter::is_closed));
    }
}
