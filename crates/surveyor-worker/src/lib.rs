//! Surveyor Worker - Worker descriptors and registry.
//!
//! This crate defines what a worker is from the engine's point of view: a
//! capability descriptor plus an invocable unit that turns one input value
//! into a lazy stream of new values. It also holds the registry the engine
//! dispatches through.
//!
//! # Architecture
//!
//! - **Descriptors** ([`descriptor`]): accepted/produced kinds, intensity, concurrency, parameter schema
//! - **Parameters** ([`params`]): typed schema and resolution of configuration overrides
//! - **Worker trait** ([`worker`]): the `process` entry point and per-run context
//! - **Registry** ([`registry`]): lookup by ID and by accepted kind
//! - **Errors** ([`error`]): registry and configuration misuse
//!
//! # Example
//!
//! ```rust
//! use futures::StreamExt;
//! use surveyor_core::{Value, ValueKind, WorkerId};
//! use surveyor_worker::{ValueStream, Worker, WorkerContext, WorkerDescriptor, WorkerRegistry};
//!
//! struct Noop;
//!
//! #[async_trait::async_trait]
//! impl Worker for Noop {
//!     fn process<'a>(&'a self, _input: &'a Value, _ctx: &'a WorkerContext) -> ValueStream<'a> {
//!         futures::stream::empty().boxed()
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut registry = WorkerRegistry::new();
//! let descriptor = WorkerDescriptor::new(WorkerId::new("dns/lookup")?, [ValueKind::Domain])
//!     .produces([ValueKind::Host, ValueKind::Ip]);
//! registry.register(descriptor, Noop)?;
//!
//! assert_eq!(registry.by_accepted_kind(ValueKind::Domain).count(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod descriptor;
pub mod error;
pub mod params;
pub mod registry;
pub mod worker;

// Re-export commonly used types
pub use descriptor::WorkerDescriptor;
pub use error::{Result, WorkerError};
pub use params::{ParameterKind, ParameterSpec, Parameters};
pub use registry::{RegisteredWorker, WorkerRegistry};
pub use worker::{ValueStream, Worker, WorkerContext};
