//! Resolution of configuration into the active worker set of a run.

use crate::error::Result;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use surveyor_core::{AppConfig, WorkerId};
use surveyor_worker::{Parameters, RegisteredWorker, WorkerRegistry};
use tracing::debug;

/// One worker that takes part in a run.
#[derive(Debug, Clone)]
pub struct ActiveWorker {
    worker: RegisteredWorker,
    concurrency: u32,
    parameters: Arc<Parameters>,
}

impl ActiveWorker {
    /// Worker ID.
    #[must_use]
    pub fn id(&self) -> &WorkerId {
        self.worker.id()
    }

    /// Registered descriptor and unit.
    #[must_use]
    pub fn worker(&self) -> &RegisteredWorker {
        &self.worker
    }

    /// Effective concurrency after overrides and the global cap.
    #[must_use]
    pub fn concurrency(&self) -> u32 {
        self.concurrency
    }

    /// Resolved parameters.
    #[must_use]
    pub fn parameters(&self) -> &Arc<Parameters> {
        &self.parameters
    }
}

/// The resolved active worker set of a run.
///
/// Built once before the run; read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ScanPlan {
    workers: Vec<ActiveWorker>,
    index: HashMap<WorkerId, usize>,
    max_depth: Option<u32>,
}

impl ScanPlan {
    /// Activate every registered worker with its declared concurrency and
    /// default parameters.
    ///
    /// # Errors
    /// Returns an error if a worker declares a required parameter without a
    /// default.
    pub fn all(registry: &WorkerRegistry) -> Result<Self> {
        let no_overrides = BTreeMap::new();
        let mut plan = Self::default();

        for worker in registry.iter() {
            let descriptor = worker.descriptor();
            let parameters = descriptor.resolve_parameters(&no_overrides)?;
            plan.push(worker.clone(), descriptor.concurrency, parameters);
        }

        Ok(plan)
    }

    /// Resolve the active set from configuration.
    ///
    /// Filters apply in this order: intensity ceiling, `scan.enabled`
    /// allow-list, `scan.disabled` deny-list, then the per-worker `enabled`
    /// flag, which wins over all of them. Concurrency is the per-worker
    /// override (or the declared value) bounded by `scan.concurrency_cap`.
    /// Parameters are resolved only for workers that end up active.
    ///
    /// # Errors
    /// - `Config` if the configuration is invalid
    /// - `Worker(WorkerNotFound)` if configuration names an unregistered worker
    /// - `Worker(..)` parameter errors from resolution
    pub fn resolve(registry: &WorkerRegistry, config: &AppConfig) -> Result<Self> {
        config.validate()?;

        let scan = &config.scan;
        for name in scan
            .enabled
            .iter()
            .chain(&scan.disabled)
            .chain(config.workers.keys())
        {
            registry.get_by_name(name)?;
        }

        let no_overrides = BTreeMap::new();
        let mut plan = Self {
            max_depth: scan.max_depth,
            ..Self::default()
        };

        for worker in registry.iter() {
            let descriptor = worker.descriptor();
            let id = descriptor.id.as_str();
            let overrides = config.worker(id);

            let mut active = descriptor.intensity <= scan.max_intensity;
            if !scan.enabled.is_empty() {
                active = active && scan.enabled.iter().any(|name| name == id);
            }
            if scan.disabled.iter().any(|name| name == id) {
                active = false;
            }
            if let Some(forced) = overrides.and_then(|o| o.enabled) {
                active = forced;
            }

            if !active {
                debug!(worker = id, intensity = %descriptor.intensity, "worker inactive for this scan");
                continue;
            }

            let mut concurrency = overrides
                .and_then(|o| o.concurrency)
                .unwrap_or(descriptor.concurrency);
            if let Some(cap) = scan.concurrency_cap {
                concurrency = concurrency.min(cap);
            }

            let parameters = descriptor
                .resolve_parameters(overrides.map_or(&no_overrides, |o| &o.parameters))?;

            plan.push(worker.clone(), concurrency, parameters);
        }

        debug!(
            active = plan.len(),
            registered = registry.count(),
            max_depth = ?plan.max_depth,
            "resolved scan plan"
        );

        Ok(plan)
    }

    /// Set the depth limit.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<u32>) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn push(&mut self, worker: RegisteredWorker, concurrency: u32, parameters: Parameters) {
        self.index.insert(worker.id().clone(), self.workers.len());
        self.workers.push(ActiveWorker {
            worker,
            concurrency: concurrency.max(1),
            parameters: Arc::new(parameters),
        });
    }

    /// Active workers, in registration order.
    pub fn workers(&self) -> impl Iterator<Item = &ActiveWorker> {
        self.workers.iter()
    }

    /// Active worker by ID.
    #[must_use]
    pub fn get(&self, worker_id: &WorkerId) -> Option<&ActiveWorker> {
        self.index.get(worker_id).map(|&i| &self.workers[i])
    }

    /// Whether a worker takes part in the run.
    #[must_use]
    pub fn is_active(&self, worker_id: &WorkerId) -> bool {
        self.index.contains_key(worker_id)
    }

    /// Depth beyond which values are not dispatched.
    #[must_use]
    pub fn max_depth(&self) -> Option<u32> {
        self.max_depth
    }

    /// Number of active workers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Whether no worker is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use futures::StreamExt;
    use surveyor_core::{Intensity, ParameterValue, Value, ValueKind, WorkerOverride};
    use surveyor_worker::{
        ParameterSpec, ValueStream, Worker, WorkerContext, WorkerDescriptor, WorkerError,
    };

    struct Silent;

    #[async_trait::async_trait]
    impl Worker for Silent {
        fn process<'a>(&'a self, _input: &'a Value, _ctx: &'a WorkerContext) -> ValueStream<'a> {
            futures::stream::empty().boxed()
        }
    }

    fn id(raw: &str) -> WorkerId {
        WorkerId::new(raw).expect("valid worker ID")
    }

    fn registry() -> WorkerRegistry {
        let mut registry = WorkerRegistry::new();
        registry
            .register(
                WorkerDescriptor::new(id("dns/lookup"), [ValueKind::Domain])
                    .with_intensity(Intensity::Passive)
                    .with_concurrency(8)
                    .with_parameter(ParameterSpec::integer("retries").with_default(2_i64)),
                Silent,
            )
            .expect("register dns/lookup");
        registry
            .register(
                WorkerDescriptor::new(id("http/probe"), [ValueKind::OpenPort])
                    .with_concurrency(4),
                Silent,
            )
            .expect("register http/probe");
        registry
            .register(
                WorkerDescriptor::new(id("port/scan"), [ValueKind::Ip])
                    .with_intensity(Intensity::Aggressive)
                    .with_concurrency(2),
                Silent,
            )
            .expect("register port/scan");
        registry
    }

    fn active_ids(plan: &ScanPlan) -> Vec<&str> {
        plan.workers().map(|w| w.id().as_str()).collect()
    }

    #[test]
    fn test_all_activates_everything() {
        let plan = ScanPlan::all(&registry()).expect("plan");
        assert_eq!(active_ids(&plan), vec!["dns/lookup", "http/probe", "port/scan"]);
        assert_eq!(plan.max_depth(), None);

        let dns = plan.get(&id("dns/lookup")).expect("dns active");
        assert_eq!(dns.concurrency(), 8);
        assert_eq!(dns.parameters().get_i64("retries"), Some(2));
    }

    #[test]
    fn test_default_config_excludes_aggressive() {
        let plan = ScanPlan::resolve(&registry(), &AppConfig::default()).expect("plan");
        assert_eq!(active_ids(&plan), vec!["dns/lookup", "http/probe"]);
        assert!(!plan.is_active(&id("port/scan")));
    }

    #[test]
    fn test_allow_and_deny_lists() {
        let mut config = AppConfig::default();
        config.scan.max_intensity = Intensity::Aggressive;
        config.scan.enabled = vec!["dns/lookup".to_string(), "port/scan".to_string()];
        config.scan.disabled = vec!["port/scan".to_string()];

        let plan = ScanPlan::resolve(&registry(), &config).expect("plan");
        assert_eq!(active_ids(&plan), vec!["dns/lookup"]);
    }

    #[test]
    fn test_worker_flag_overrides_filters() {
        let mut config = AppConfig::default();
        config.scan.disabled = vec!["dns/lookup".to_string()];
        config.workers.insert(
            "port/scan".to_string(),
            WorkerOverride {
                enabled: Some(true),
                ..WorkerOverride::default()
            },
        );
        config.workers.insert(
            "dns/lookup".to_string(),
            WorkerOverride {
                enabled: Some(true),
                ..WorkerOverride::default()
            },
        );
        config.workers.insert(
            "http/probe".to_string(),
            WorkerOverride {
                enabled: Some(false),
                ..WorkerOverride::default()
            },
        );

        let plan = ScanPlan::resolve(&registry(), &config).expect("plan");
        assert_eq!(active_ids(&plan), vec!["dns/lookup", "port/scan"]);
    }

    #[test]
    fn test_concurrency_override_and_cap() {
        let mut config = AppConfig::default();
        config.scan.concurrency_cap = Some(3);
        config.workers.insert(
            "http/probe".to_string(),
            WorkerOverride {
                concurrency: Some(1),
                ..WorkerOverride::default()
            },
        );

        let plan = ScanPlan::resolve(&registry(), &config).expect("plan");
        assert_eq!(plan.get(&id("dns/lookup")).map(ActiveWorker::concurrency), Some(3));
        assert_eq!(plan.get(&id("http/probe")).map(ActiveWorker::concurrency), Some(1));
    }

    #[test]
    fn test_parameter_overrides() {
        let mut config = AppConfig::default();
        let mut overrides = WorkerOverride::default();
        overrides
            .parameters
            .insert("retries".to_string(), ParameterValue::Integer(5));
        config.workers.insert("dns/lookup".to_string(), overrides);
        config.scan.max_depth = Some(4);

        let plan = ScanPlan::resolve(&registry(), &config).expect("plan");
        let dns = plan.get(&id("dns/lookup")).expect("dns active");
        assert_eq!(dns.parameters().get_i64("retries"), Some(5));
        assert_eq!(plan.max_depth(), Some(4));
    }

    #[test]
    fn test_unknown_worker_is_an_error() {
        let mut config = AppConfig::default();
        config.scan.disabled = vec!["ghost/worker".to_string()];

        let err = ScanPlan::resolve(&registry(), &config).expect_err("unknown worker");
        assert!(matches!(
            err,
            EngineError::Worker(WorkerError::WorkerNotFound { ref worker_id }) if worker_id == "ghost/worker"
        ));
    }

    #[test]
    fn test_bad_parameter_is_an_error() {
        let mut config = AppConfig::default();
        let mut overrides = WorkerOverride::default();
        overrides
            .parameters
            .insert("retries".to_string(), ParameterValue::from("lots"));
        config.workers.insert("dns/lookup".to_string(), overrides);

        let err = ScanPlan::resolve(&registry(), &config).expect_err("bad parameter");
        assert!(matches!(
            err,
            EngineError::Worker(WorkerError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = AppConfig::default();
        config.scan.concurrency_cap = Some(0);
        assert!(matches!(
            ScanPlan::resolve(&registry(), &config),
            Err(EngineError::Config(_))
        ));
    }
}
