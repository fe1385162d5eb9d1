//! Surveyor Core - Foundation crate for the Surveyor discovery engine.
//!
//! This crate provides the value model, shared types, error handling,
//! configuration management and tracing setup that the worker and engine
//! crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared newtypes and enums (`WorkerId`, `Intensity`, `ParameterValue`, `Timestamp`)
//! - [`value`] - Typed, immutable discovered facts with provenance
//! - [`telemetry`] - Tracing subscriber initialisation
//!
//! # Example
//!
//! ```rust
//! use surveyor_core::{Value, ValueKind};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let seed = Value::classify("Example.COM.")?;
//! assert_eq!(seed.kind(), ValueKind::Domain);
//! assert_eq!(seed.canonical(), "example.com");
//! assert_eq!(seed.depth(), 0);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod telemetry;
pub mod types;
pub mod value;

// Re-export commonly used types
pub use config::{AppConfig, GeneralConfig, ScanConfig, WorkerOverride};
pub use error::{ConfigError, ConfigResult, Result, SurveyorError};
pub use types::{Intensity, ParameterValue, Timestamp, WorkerId};
pub use value::{CertRecord, DedupKey, Endpoint, Payload, Value, ValueId, ValueKind};
