//! The value-routing scheduler.
//!
//! A run seeds a frontier with initial values, dispatches every frontier
//! value to each active worker that accepts its kind, and feeds the values
//! those jobs produce back into the frontier until nothing is queued and
//! nothing is in flight.
//!
//! The scheduler task owns the frontier, the in-flight job set and the run
//! report. Jobs run as tokio tasks: each one waits for a slot on its
//! worker's limiter, drives the worker's stream, deduplicates and announces
//! what it finds, and hands new values back over a channel.

use crate::dedup::DedupStore;
use crate::error::{EngineError, Result};
use crate::events::{EventBus, EventReceiver, ScanEvent};
use crate::limiter::{ConcurrencyLimiter, LimiterSet};
use crate::plan::ScanPlan;
use crate::report::{RunReport, SetupFailure};
use futures::{FutureExt, StreamExt};
use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use surveyor_core::{Timestamp, Value, WorkerId};
use surveyor_worker::{RegisteredWorker, WorkerContext, WorkerError, WorkerRegistry};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// How a job ended, as seen by the scheduler.
enum JobOutcome {
    Succeeded,
    Failed(String),
    Fatal(EngineError),
}

/// State shared by every job of one run.
struct RunShared {
    dedup: DedupStore,
    bus: EventBus,
    jobs_started: AtomicUsize,
}

/// Why the dispatch loop stopped.
enum LoopExit {
    Drained,
    Cancelled,
}

/// Runs scans against a registry and a resolved plan.
///
/// Cheap to clone; clones share the registry, plan and event bus.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use surveyor_core::Value;
/// use surveyor_engine::{ScanEngine, ScanPlan};
/// use surveyor_worker::WorkerRegistry;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let registry = Arc::new(WorkerRegistry::new());
/// let plan = ScanPlan::all(&registry)?;
/// let engine = ScanEngine::new(registry, plan);
///
/// let report = engine.run(vec![Value::domain("example.com")?]).await?;
/// assert_eq!(report.discovered.len(), 1);
/// assert_eq!(report.jobs_started, 0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ScanEngine {
    registry: Arc<WorkerRegistry>,
    plan: Arc<ScanPlan>,
    bus: EventBus,
}

impl ScanEngine {
    /// Create an engine.
    ///
    /// `plan` is expected to be resolved against `registry`; runs fail with
    /// [`WorkerError::WorkerNotFound`] for any plan worker it does not hold.
    #[must_use]
    pub fn new(registry: Arc<WorkerRegistry>, plan: ScanPlan) -> Self {
        Self {
            registry,
            plan: Arc::new(plan),
            bus: EventBus::new(),
        }
    }

    /// Use an existing event bus instead of a private one.
    #[must_use]
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.bus = bus;
        self
    }

    /// Event bus of this engine.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    /// Subscribe to events of subsequent runs.
    #[must_use]
    pub fn subscribe(&self) -> EventReceiver {
        self.bus.subscribe()
    }

    /// Resolved plan.
    #[must_use]
    pub fn plan(&self) -> &ScanPlan {
        &self.plan
    }

    /// Run to completion.
    pub async fn run(&self, seeds: Vec<Value>) -> Result<RunReport> {
        self.run_until(seeds, CancellationToken::new()).await
    }

    /// Spawn a run and return a handle to stop or await it.
    #[must_use]
    pub fn start(&self, seeds: Vec<Value>) -> ScanHandle {
        let cancel = CancellationToken::new();
        let engine = self.clone();
        let token = cancel.clone();
        let task = tokio::spawn(async move { engine.run_until(seeds, token).await });

        ScanHandle { cancel, task }
    }

    /// Run until the frontier drains or `cancel` fires.
    ///
    /// Cancellation is not an error: in-flight jobs are aborted, their slots
    /// released, and the report comes back with `cancelled` set.
    ///
    /// # Errors
    /// Returns [`WorkerError::WorkerNotFound`] before anything runs if the
    /// plan names a worker missing from the registry. Returns a
    /// scheduler-fatal error (for example a closed limiter) after every
    /// in-flight job has been aborted and drained.
    pub async fn run_until(&self, seeds: Vec<Value>, cancel: CancellationToken) -> Result<RunReport> {
        if let Some(missing) = self
            .plan
            .workers()
            .find(|active| !self.registry.contains(active.id()))
        {
            return Err(WorkerError::WorkerNotFound {
                worker_id: missing.id().to_string(),
            }
            .into());
        }

        let mut report = RunReport::new(Timestamp::now());
        let run_token = cancel.child_token();

        info!(
            seeds = seeds.len(),
            workers = self.plan.len(),
            max_depth = ?self.plan.max_depth(),
            "scan started"
        );

        let contexts = self.setup_workers(&run_token, &mut report).await;

        let mut limiters = LimiterSet::new();
        for active in self.plan.workers() {
            if contexts.contains_key(active.id()) {
                limiters.insert(active.id().clone(), active.concurrency() as usize);
            }
        }

        let shared = Arc::new(RunShared {
            dedup: DedupStore::new(),
            bus: self.bus.clone(),
            jobs_started: AtomicUsize::new(0),
        });

        let mut frontier = VecDeque::new();
        for seed in seeds {
            let seed = seed.into_seed();
            if !shared.dedup.test_and_insert(seed.dedup_key()) {
                debug!(value = %seed, "duplicate seed ignored");
                continue;
            }
            let seed = Arc::new(seed);
            shared.bus.emit(ScanEvent::ValueDiscovered {
                value: Arc::clone(&seed),
                parent: None,
            });
            report.discovered.push(Arc::clone(&seed));
            frontier.push_back(seed);
        }

        let outcome = if run_token.is_cancelled() {
            Ok(LoopExit::Cancelled)
        } else {
            self.dispatch_loop(
                frontier,
                &contexts,
                &limiters,
                &shared,
                &run_token,
                &mut report,
            )
            .await
        };

        report.jobs_started = shared.jobs_started.load(Ordering::SeqCst);
        report.finished_at = Timestamp::now();

        match outcome {
            Ok(exit) => {
                report.cancelled = matches!(exit, LoopExit::Cancelled);
                info!(
                    discovered = report.discovered.len(),
                    jobs_started = report.jobs_started,
                    jobs_failed = report.jobs_failed,
                    cancelled = report.cancelled,
                    duration_ms = report.duration_ms(),
                    "scan finished"
                );
                Ok(report)
            }
            Err(e) => {
                error!(error = %e, "scan aborted");
                Err(e)
            }
        }
    }

    /// Run every active worker's setup hook; returns contexts of those that
    /// succeeded.
    async fn setup_workers(
        &self,
        run_token: &CancellationToken,
        report: &mut RunReport,
    ) -> HashMap<WorkerId, WorkerContext> {
        let mut contexts = HashMap::new();

        for active in self.plan.workers() {
            let worker_id = active.id().clone();
            let ctx = WorkerContext::new(
                worker_id.clone(),
                Arc::clone(active.parameters()),
                run_token.child_token(),
            );

            let setup = AssertUnwindSafe(active.worker().unit().setup(&ctx)).catch_unwind();
            let result = tokio::select! {
                biased;
                () = run_token.cancelled() => None,
                result = setup => Some(result),
            };
            let Some(result) = result else {
                break;
            };
            let result = result.unwrap_or_else(|payload| {
                Err(anyhow::anyhow!(
                    "setup panicked: {}",
                    panic_message(payload.as_ref())
                ))
            });

            match result {
                Ok(()) => {
                    debug!(worker = %worker_id, concurrency = active.concurrency(), "worker ready");
                    self.bus.emit(ScanEvent::WorkerStarted {
                        worker: worker_id.clone(),
                    });
                    contexts.insert(worker_id, ctx);
                }
                Err(e) => {
                    let error = format!("{e:#}");
                    warn!(worker = %worker_id, error = %error, "worker setup failed, disabled for this run");
                    report.setup_failures.push(SetupFailure {
                        worker: worker_id,
                        error,
                    });
                }
            }
        }

        contexts
    }

    async fn dispatch_loop(
        &self,
        mut frontier: VecDeque<Arc<Value>>,
        contexts: &HashMap<WorkerId, WorkerContext>,
        limiters: &LimiterSet,
        shared: &Arc<RunShared>,
        run_token: &CancellationToken,
        report: &mut RunReport,
    ) -> Result<LoopExit> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Arc<Value>>();
        let mut jobs: JoinSet<JobOutcome> = JoinSet::new();
        let mut in_flight: HashMap<tokio::task::Id, (WorkerId, Arc<Value>)> = HashMap::new();

        let result = 'dispatch: loop {
            while let Some(value) = frontier.pop_front() {
                if self.plan.max_depth().is_some_and(|max| value.depth() > max) {
                    debug!(value = %value, depth = value.depth(), "depth limit reached, not dispatched");
                    report.depth_limited += 1;
                    continue;
                }

                for worker in self.registry.by_accepted_kind(value.kind()) {
                    let Some(ctx) = contexts.get(worker.id()) else {
                        continue;
                    };
                    let Some(limiter) = limiters.get(worker.id()) else {
                        break 'dispatch Err(EngineError::Internal(format!(
                            "no limiter for active worker {}",
                            worker.id()
                        )));
                    };

                    let job = run_job(
                        worker.clone(),
                        ctx.clone(),
                        limiter.clone(),
                        Arc::clone(&value),
                        Arc::clone(shared),
                        tx.clone(),
                    );
                    let handle = jobs.spawn(job);
                    in_flight.insert(handle.id(), (worker.id().clone(), Arc::clone(&value)));
                }
            }

            if jobs.is_empty() {
                break 'dispatch Ok(LoopExit::Drained);
            }

            tokio::select! {
                biased;
                () = run_token.cancelled() => break 'dispatch Ok(LoopExit::Cancelled),
                Some(value) = rx.recv() => {
                    report.discovered.push(Arc::clone(&value));
                    frontier.push_back(value);
                }
                Some(joined) = jobs.join_next_with_id() => {
                    if let Err(e) = settle(joined, &mut in_flight, shared, report) {
                        break 'dispatch Err(e);
                    }
                }
            }

            while let Ok(value) = rx.try_recv() {
                report.discovered.push(Arc::clone(&value));
                frontier.push_back(value);
            }
        };

        if !jobs.is_empty() {
            debug!(in_flight = jobs.len(), "aborting in-flight jobs");
            limiters.close_all();
            run_token.cancel();
            jobs.shutdown().await;
        }

        // Values announced by jobs that were running when the loop stopped
        while let Ok(value) = rx.try_recv() {
            report.discovered.push(value);
        }

        result
    }
}

/// Fold a finished job into the report.
fn settle(
    joined: std::result::Result<(tokio::task::Id, JobOutcome), JoinError>,
    in_flight: &mut HashMap<tokio::task::Id, (WorkerId, Arc<Value>)>,
    shared: &RunShared,
    report: &mut RunReport,
) -> Result<()> {
    let (id, outcome) = match joined {
        Ok((id, outcome)) => (id, Ok(outcome)),
        Err(e) => (e.id(), Err(e)),
    };

    let (worker, value) = in_flight
        .remove(&id)
        .ok_or_else(|| EngineError::Internal(format!("finished job {id} was not tracked")))?;

    match outcome {
        Ok(JobOutcome::Succeeded) => {
            report.jobs_succeeded += 1;
            Ok(())
        }
        Ok(JobOutcome::Failed(error)) => {
            report.record_failure(worker, value, error);
            Ok(())
        }
        Ok(JobOutcome::Fatal(e)) => Err(e),
        Err(e) if e.is_panic() => {
            let payload = e.into_panic();
            let error = format!("worker panicked: {}", panic_message(payload.as_ref()));
            warn!(worker = %worker, value = %value, error = %error, "job panicked");
            shared.bus.emit(ScanEvent::JobFailed {
                worker: worker.clone(),
                value: Arc::clone(&value),
                error: error.clone(),
            });
            report.record_failure(worker, value, error);
            Ok(())
        }
        Err(e) => Err(EngineError::Internal(format!(
            "job for {worker} on {value} was cancelled unexpectedly: {e}"
        ))),
    }
}

/// Drive one worker invocation.
async fn run_job(
    worker: RegisteredWorker,
    ctx: WorkerContext,
    limiter: ConcurrencyLimiter,
    input: Arc<Value>,
    shared: Arc<RunShared>,
    tx: mpsc::UnboundedSender<Arc<Value>>,
) -> JobOutcome {
    let permit = match limiter.acquire().await {
        Ok(permit) => permit,
        Err(e) => return JobOutcome::Fatal(e),
    };

    let worker_id = worker.id().clone();
    let descriptor = Arc::clone(worker.descriptor());
    shared.jobs_started.fetch_add(1, Ordering::SeqCst);
    shared.bus.emit(ScanEvent::JobStarted {
        worker: worker_id.clone(),
        value: Arc::clone(&input),
    });
    debug!(worker = %worker_id, value = %input, depth = input.depth(), "job started");

    let unit = Arc::clone(worker.unit());
    let mut stream = unit.process(&input, &ctx);
    let mut failure = None;

    while let Some(item) = stream.next().await {
        match item {
            Ok(raw) => {
                let value = raw.derive(&input, worker_id.clone());

                if !descriptor.outputs.is_empty() && !descriptor.produces_kind(value.kind()) {
                    warn!(
                        worker = %worker_id,
                        kind = %value.kind(),
                        "worker produced a kind it does not declare"
                    );
                }

                if !shared.dedup.test_and_insert(value.dedup_key()) {
                    continue;
                }

                let value = Arc::new(value);
                debug!(worker = %worker_id, value = %value, depth = value.depth(), "value discovered");
                shared.bus.emit(ScanEvent::ValueDiscovered {
                    value: Arc::clone(&value),
                    parent: Some(input.id()),
                });
                if tx.send(value).is_err() {
                    break;
                }
            }
            Err(e) => {
                failure = Some(format!("{e:#}"));
                break;
            }
        }
    }

    drop(stream);
    permit.release();

    match failure {
        None => {
            debug!(worker = %worker_id, value = %input, "job finished");
            JobOutcome::Succeeded
        }
        Some(error) => {
            warn!(worker = %worker_id, value = %input, error = %error, "job failed");
            shared.bus.emit(ScanEvent::JobFailed {
                worker: worker_id,
                value: input,
                error: error.clone(),
            });
            JobOutcome::Failed(error)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// A run spawned with [`ScanEngine::start`].
#[derive(Debug)]
pub struct ScanHandle {
    cancel: CancellationToken,
    task: JoinHandle<Result<RunReport>>,
}

impl ScanHandle {
    /// Request the run to stop. In-flight jobs are aborted.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Token that stops the run when cancelled.
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Whether the run has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the run and return its report.
    pub async fn join(self) -> Result<RunReport> {
        self.task
            .await
            .map_err(|e| EngineError::Internal(format!("scan task failed: {e}")))?
    }
}
