//! Error types for the scan engine.

use surveyor_core::{ConfigError, WorkerId};
use surveyor_worker::WorkerError;
use thiserror::Error;

/// Errors that abort a run or prevent it from starting.
///
/// Individual job failures are not errors at this level; they are reported
/// through [`ScanEvent::JobFailed`](crate::ScanEvent::JobFailed) and the
/// [`RunReport`](crate::RunReport).
#[derive(Error, Debug)]
pub enum EngineError {
    /// Registry or plan resolution failure
    #[error("worker error: {0}")]
    Worker(#[from] WorkerError),

    /// Invalid configuration handed to plan resolution
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A concurrency limiter was closed while jobs still needed it
    #[error("concurrency limiter closed for {worker_id}")]
    LimiterClosed {
        /// Worker whose limiter was closed
        worker_id: WorkerId,
    },

    /// Scheduler bookkeeping went out of sync
    #[error("internal engine error: {0}")]
    Internal(String),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let worker_id = WorkerId::new("dns/lookup").expect("valid worker ID");
        let err = EngineError::LimiterClosed { worker_id };
        assert_eq!(err.to_string(), "concurrency limiter closed for dns/lookup");
    }

    #[test]
    fn test_from_worker_error() {
        let err: EngineError = WorkerError::WorkerNotFound {
            worker_id: "ghost".to_string(),
        }
        .into();
        assert!(matches!(err, EngineError::Worker(_)));
        assert_eq!(err.to_string(), "worker error: worker not found: ghost");
    }
}
