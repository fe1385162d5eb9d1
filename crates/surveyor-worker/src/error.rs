//! Error types for the worker subsystem.

use surveyor_core::WorkerId;
use thiserror::Error;

/// Errors that can occur while describing, registering or configuring workers.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// A worker with this ID is already registered
    #[error("worker already registered: {worker_id}")]
    DuplicateWorker {
        /// The conflicting worker ID
        worker_id: WorkerId,
    },

    /// No worker with this ID is registered
    #[error("worker not found: {worker_id}")]
    WorkerNotFound {
        /// The worker ID that was looked up
        worker_id: String,
    },

    /// Descriptor failed validation
    #[error("invalid descriptor for {worker_id}: {reason}")]
    InvalidDescriptor {
        /// Worker being validated
        worker_id: WorkerId,
        /// Reason for validation failure
        reason: String,
    },

    /// A parameter override has the wrong type
    #[error("invalid value for parameter '{parameter}' of {worker_id}: {reason}")]
    InvalidParameter {
        /// Worker owning the parameter
        worker_id: WorkerId,
        /// Parameter name
        parameter: String,
        /// What was wrong with the value
        reason: String,
    },

    /// A required parameter has neither a default nor an override
    #[error("missing required parameter '{parameter}' for {worker_id}")]
    MissingParameter {
        /// Worker owning the parameter
        worker_id: WorkerId,
        /// Parameter name
        parameter: String,
    },

    /// An override names a parameter the worker does not declare
    #[error("unknown parameter '{parameter}' for {worker_id}")]
    UnknownParameter {
        /// Worker the override was aimed at
        worker_id: WorkerId,
        /// Parameter name
        parameter: String,
    },

    /// Invalid worker ID format
    #[error("invalid worker ID: {0}")]
    InvalidId(#[from] surveyor_core::SurveyorError),
}

/// Result type for worker operations.
pub type Result<T> = std::result::Result<T, WorkerError>;
