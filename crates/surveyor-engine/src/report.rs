//! Summary of a finished run.

use serde::Serialize;
use std::sync::Arc;
use surveyor_core::{Timestamp, Value, ValueKind, WorkerId};

/// One failed job.
#[derive(Debug, Clone, Serialize)]
pub struct JobFailure {
    /// Worker that failed
    pub worker: WorkerId,
    /// Input value of the job
    pub value: Arc<Value>,
    /// Rendered error chain
    pub error: String,
}

/// One worker whose setup hook failed; it took no part in the run.
#[derive(Debug, Clone, Serialize)]
pub struct SetupFailure {
    /// Worker that was deactivated
    pub worker: WorkerId,
    /// Rendered error chain
    pub error: String,
}

/// Outcome of a run.
///
/// Produced for completed and cancelled runs alike; `cancelled` tells them
/// apart.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// When the run started
    pub started_at: Timestamp,
    /// When the run finished
    pub finished_at: Timestamp,
    /// Every accepted value, seeds first, in the order the scheduler received them
    pub discovered: Vec<Arc<Value>>,
    /// Jobs that acquired a slot and invoked their worker
    pub jobs_started: usize,
    /// Jobs whose stream was drained without error
    pub jobs_succeeded: usize,
    /// Jobs that ended with an error or a panic
    pub jobs_failed: usize,
    /// Details of every failed job
    pub failures: Vec<JobFailure>,
    /// Workers deactivated by a failing setup hook
    pub setup_failures: Vec<SetupFailure>,
    /// Whether the run was stopped before the frontier drained
    pub cancelled: bool,
    /// Values not dispatched because they exceeded the depth limit
    pub depth_limited: usize,
}

impl RunReport {
    pub(crate) fn new(started_at: Timestamp) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            discovered: Vec::new(),
            jobs_started: 0,
            jobs_succeeded: 0,
            jobs_failed: 0,
            failures: Vec::new(),
            setup_failures: Vec::new(),
            cancelled: false,
            depth_limited: 0,
        }
    }

    pub(crate) fn record_failure(&mut self, worker: WorkerId, value: Arc<Value>, error: String) {
        self.jobs_failed += 1;
        self.failures.push(JobFailure {
            worker,
            value,
            error,
        });
    }

    /// Wall-clock duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        self.finished_at.millis_since(&self.started_at)
    }

    /// Completed without job failures, setup failures or cancellation.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !self.cancelled && self.failures.is_empty() && self.setup_failures.is_empty()
    }

    /// Discovered values of one kind, in discovery order.
    pub fn discovered_of_kind(&self, kind: ValueKind) -> impl Iterator<Item = &Arc<Value>> {
        self.discovered.iter().filter(move |v| v.kind() == kind)
    }

    /// Failures reported by one worker.
    pub fn failures_for<'a>(&'a self, worker: &'a WorkerId) -> impl Iterator<Item = &'a JobFailure> {
        self.failures.iter().filter(move |f| &f.worker == worker)
    }
}
