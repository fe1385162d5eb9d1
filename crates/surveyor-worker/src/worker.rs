//! The invocable side of a worker.

use crate::params::Parameters;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Arc;
use surveyor_core::{Value, WorkerId};
use tokio_util::sync::CancellationToken;

/// Lazy, finite sequence of raw values produced by one invocation.
///
/// An `Err` item ends the invocation as a failure; the engine stops polling
/// the stream after the first error.
pub type ValueStream<'a> = BoxStream<'a, anyhow::Result<Value>>;

/// A pluggable analysis unit.
///
/// Implementations must be thread-safe; one instance serves every invocation
/// of its worker ID, possibly concurrently (up to the descriptor's
/// concurrency). Workers yield plain values built with the constructors on
/// [`Value`]; the engine attaches provenance.
///
/// # Example
///
/// ```rust
/// use futures::stream::{self, StreamExt};
/// use surveyor_core::Value;
/// use surveyor_worker::{ValueStream, Worker, WorkerContext};
///
/// struct WwwPrefix;
///
/// #[async_trait::async_trait]
/// impl Worker for WwwPrefix {
///     fn process<'a>(&'a self, input: &'a Value, _ctx: &'a WorkerContext) -> ValueStream<'a> {
///         let name = format!("www.{}", input.canonical());
///         stream::once(async move { Value::host(&name).map_err(anyhow::Error::from) }).boxed()
///     }
/// }
/// ```
#[async_trait]
pub trait Worker: Send + Sync {
    /// One-time preparation before the first invocation of a run.
    ///
    /// A failure disables the worker for that run.
    async fn setup(&self, _ctx: &WorkerContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Produce values derived from `input`.
    fn process<'a>(&'a self, input: &'a Value, ctx: &'a WorkerContext) -> ValueStream<'a>;
}

/// Per-run context handed to every invocation of a worker.
#[derive(Debug, Clone)]
pub struct WorkerContext {
    worker_id: WorkerId,
    parameters: Arc<Parameters>,
    cancel: CancellationToken,
}

impl WorkerContext {
    /// Build a context.
    #[must_use]
    pub fn new(worker_id: WorkerId, parameters: Arc<Parameters>, cancel: CancellationToken) -> Self {
        Self {
            worker_id,
            parameters,
            cancel,
        }
    }

    /// ID of the worker this context belongs to.
    #[must_use]
    pub fn worker_id(&self) -> &WorkerId {
        &self.worker_id
    }

    /// Resolved parameters.
    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Token cancelled when the run is stopping.
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Whether the run is stopping.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    struct Echo;

    #[async_trait]
    impl Worker for Echo {
        fn process<'a>(&'a self, input: &'a Value, _ctx: &'a WorkerContext) -> ValueStream<'a> {
            futures::stream::iter(vec![Ok::<_, anyhow::Error>(input.clone())]).boxed()
        }
    }

    fn context() -> WorkerContext {
        WorkerContext::new(
            WorkerId::new("test/echo").expect("valid worker ID"),
            Arc::new(Parameters::default()),
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn test_default_setup_succeeds() {
        let ctx = context();
        Echo.setup(&ctx).await.expect("default setup");
    }

    #[tokio::test]
    async fn test_process_is_lazy_stream() {
        let ctx = context();
        let input = Value::domain("example.com").expect("valid domain");
        let outputs: Vec<_> = Echo.process(&input, &ctx).collect().await;
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].as_ref().expect("ok item"), &input);
    }

    #[test]
    fn test_context_cancellation() {
        let token = CancellationToken::new();
        let ctx = WorkerContext::new(
            WorkerId::new("test/echo").expect("valid worker ID"),
            Arc::new(Parameters::default()),
            token.child_token(),
        );
        assert!(!ctx.is_cancelled());
        token.cancel();
        assert!(ctx.is_cancelled());
        assert_eq!(ctx.worker_id().as_str(), "test/echo");
        assert!(ctx.parameters().is_empty());
    }
}
