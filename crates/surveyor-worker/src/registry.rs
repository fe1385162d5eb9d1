//! In-memory worker registry with lookup by ID and by accepted kind.

use crate::{
    descriptor::WorkerDescriptor,
    error::{Result, WorkerError},
    worker::Worker,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use surveyor_core::{Intensity, ValueKind, WorkerId};
use tracing::debug;

/// A descriptor paired with the unit that implements it.
#[derive(Clone)]
pub struct RegisteredWorker {
    descriptor: Arc<WorkerDescriptor>,
    unit: Arc<dyn Worker>,
}

impl RegisteredWorker {
    /// Worker ID.
    #[must_use]
    pub fn id(&self) -> &WorkerId {
        &self.descriptor.id
    }

    /// Capability descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &Arc<WorkerDescriptor> {
        &self.descriptor
    }

    /// Invocable unit.
    #[must_use]
    pub fn unit(&self) -> &Arc<dyn Worker> {
        &self.unit
    }
}

impl fmt::Debug for RegisteredWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredWorker")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Registry of every worker available to a run.
///
/// Built once during setup and then shared read-only (typically behind an
/// `Arc`) with the engine. Lookups by kind return workers in registration
/// order; this is the engine's only dispatch mechanism.
#[derive(Default)]
pub struct WorkerRegistry {
    workers: Vec<RegisteredWorker>,
    by_id: HashMap<WorkerId, usize>,
    by_kind: HashMap<ValueKind, Vec<usize>>,
}

impl WorkerRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a worker under its descriptor's ID.
    ///
    /// # Errors
    /// - [`WorkerError::DuplicateWorker`] if the ID is already registered
    /// - [`WorkerError::InvalidDescriptor`] if the descriptor fails validation
    pub fn register<W>(&mut self, descriptor: WorkerDescriptor, unit: W) -> Result<()>
    where
        W: Worker + 'static,
    {
        self.register_shared(descriptor, Arc::new(unit))
    }

    /// Register a worker whose unit is already shared.
    pub fn register_shared(
        &mut self,
        descriptor: WorkerDescriptor,
        unit: Arc<dyn Worker>,
    ) -> Result<()> {
        descriptor.validate()?;

        if self.by_id.contains_key(&descriptor.id) {
            return Err(WorkerError::DuplicateWorker {
                worker_id: descriptor.id,
            });
        }

        let index = self.workers.len();
        for kind in &descriptor.accepts {
            self.by_kind.entry(*kind).or_default().push(index);
        }
        self.by_id.insert(descriptor.id.clone(), index);

        debug!(
            worker_id = %descriptor.id,
            accepts = ?descriptor.accepts,
            concurrency = descriptor.concurrency,
            "registered worker"
        );

        self.workers.push(RegisteredWorker {
            descriptor: Arc::new(descriptor),
            unit,
        });

        Ok(())
    }

    /// Look up a worker by ID.
    ///
    /// # Errors
    /// Returns [`WorkerError::WorkerNotFound`] if no such worker is registered.
    pub fn get(&self, worker_id: &WorkerId) -> Result<&RegisteredWorker> {
        self.by_id
            .get(worker_id)
            .map(|&index| &self.workers[index])
            .ok_or_else(|| WorkerError::WorkerNotFound {
                worker_id: worker_id.to_string(),
            })
    }

    /// Look up a worker by its ID string, as written in configuration.
    ///
    /// # Errors
    /// Returns [`WorkerError::WorkerNotFound`] if the string is not a
    /// registered ID (including strings that are not valid IDs at all).
    pub fn get_by_name(&self, name: &str) -> Result<&RegisteredWorker> {
        let not_found = || WorkerError::WorkerNotFound {
            worker_id: name.to_string(),
        };
        let worker_id = WorkerId::new(name).map_err(|_| not_found())?;
        self.get(&worker_id).map_err(|_| not_found())
    }

    /// Workers whose `accepts` includes `kind`, in registration order.
    pub fn by_accepted_kind(&self, kind: ValueKind) -> impl Iterator<Item = &RegisteredWorker> {
        self.by_kind
            .get(&kind)
            .into_iter()
            .flatten()
            .map(|&index| &self.workers[index])
    }

    /// All workers, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredWorker> {
        self.workers.iter()
    }

    /// All worker IDs, in registration order.
    #[must_use]
    pub fn ids(&self) -> Vec<WorkerId> {
        self.workers.iter().map(|w| w.id().clone()).collect()
    }

    /// Whether a worker is registered.
    #[must_use]
    pub fn contains(&self, worker_id: &WorkerId) -> bool {
        self.by_id.contains_key(worker_id)
    }

    /// Number of registered workers.
    #[must_use]
    pub fn count(&self) -> usize {
        self.workers.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Worker count by intensity.
    #[must_use]
    pub fn count_by_intensity(&self) -> HashMap<Intensity, usize> {
        let mut counts: HashMap<Intensity, usize> = HashMap::new();

        for worker in &self.workers {
            *counts.entry(worker.descriptor.intensity).or_insert(0) += 1;
        }

        counts
    }
}

impl fmt::Debug for WorkerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerRegistry")
            .field("workers", &self.ids())
            .finish()
    }
}
