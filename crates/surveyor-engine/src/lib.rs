//! Surveyor Engine - Value-routing scan scheduler.
//!
//! The engine takes seed values, routes each one to every active worker that
//! accepts its kind, and feeds what the workers find back into the traversal
//! until nothing is left to do. Along the way it deduplicates rediscovered
//! facts, bounds the parallelism of each worker, tracks provenance and depth,
//! and reports job lifecycle and failures.
//!
//! # Architecture
//!
//! - **Plan** ([`plan`]): configuration resolved into the active worker set
//! - **Dedup** ([`dedup`]): atomic test-and-insert over canonical keys
//! - **Limiters** ([`limiter`]): per-worker bounded parallelism
//! - **Events** ([`events`]): lossless fan-out of lifecycle notifications
//! - **Engine** ([`engine`]): the traversal loop, cancellation and handles
//! - **Report** ([`report`]): what a run found and what failed
//!
//! # Example
//!
//! ```rust
//! use futures::stream::{self, StreamExt};
//! use std::sync::Arc;
//! use surveyor_core::{Value, ValueKind, WorkerId};
//! use surveyor_engine::{ScanEngine, ScanPlan};
//! use surveyor_worker::{ValueStream, Worker, WorkerContext, WorkerDescriptor, WorkerRegistry};
//!
//! struct WwwPrefix;
//!
//! #[async_trait::async_trait]
//! impl Worker for WwwPrefix {
//!     fn process<'a>(&'a self, input: &'a Value, _ctx: &'a WorkerContext) -> ValueStream<'a> {
//!         let name = format!("www.{}", input.canonical());
//!         stream::once(async move { Value::host(&name).map_err(anyhow::Error::from) }).boxed()
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut registry = WorkerRegistry::new();
//! registry.register(
//!     WorkerDescriptor::new(WorkerId::new("dns/www")?, [ValueKind::Domain])
//!         .produces([ValueKind::Host]),
//!     WwwPrefix,
//! )?;
//! let registry = Arc::new(registry);
//!
//! let engine = ScanEngine::new(Arc::clone(&registry), ScanPlan::all(&registry)?);
//! let report = engine.run(vec![Value::domain("example.com")?]).await?;
//!
//! assert_eq!(report.discovered.len(), 2);
//! assert_eq!(report.discovered[1].canonical(), "www.example.com");
//! assert_eq!(report.discovered[1].depth(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod dedup;
pub mod engine;
pub mod error;
pub mod events;
pub mod limiter;
pub mod plan;
pub mod report;

// Re-export commonly used types
pub use dedup::DedupStore;
pub use engine::{ScanEngine, ScanHandle};
pub use error::{EngineError, Result};
pub use events::{EventBus, EventReceiver, ScanEvent};
pub use limiter::{ConcurrencyLimiter, LimiterPermit, LimiterSet};
pub use plan::{ActiveWorker, ScanPlan};
pub use report::{JobFailure, RunReport, SetupFailure};
