//! Scan lifecycle events and the bus that delivers them.
//!
//! # Guarantees
//!
//! - **Lossless**: every subscriber receives every event emitted after it
//!   subscribed, in emission order. Queues are unbounded per subscriber.
//! - **Per-job order**: `JobStarted` precedes `JobFailed` for the same job.
//! - **Parents first**: a value's `ValueDiscovered` is emitted before the
//!   value is queued for dispatch, so consumers see a fact before any of its
//!   descendants.
//!
//! There is no ordering across independent jobs or sibling values.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use surveyor_core::{Value, ValueId, WorkerId};
use tokio::sync::mpsc;

/// A notification emitted during a run.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// A worker finished setup and will receive values
    WorkerStarted {
        /// Worker that started
        worker: WorkerId,
    },

    /// A job acquired its slot and is about to drive the worker
    JobStarted {
        /// Worker being invoked
        worker: WorkerId,
        /// Input value
        value: Arc<Value>,
    },

    /// A job ended with an error (or a panic)
    JobFailed {
        /// Worker that failed
        worker: WorkerId,
        /// Input value of the failed job
        value: Arc<Value>,
        /// Rendered error chain
        error: String,
    },

    /// A new fact entered the run
    ValueDiscovered {
        /// The discovered value
        value: Arc<Value>,
        /// Identity of the value it was derived from (`None` for seeds)
        parent: Option<ValueId>,
    },
}

impl ScanEvent {
    /// Short event name, used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::WorkerStarted { .. } => "worker_started",
            Self::JobStarted { .. } => "job_started",
            Self::JobFailed { .. } => "job_failed",
            Self::ValueDiscovered { .. } => "value_discovered",
        }
    }
}

/// Receiving half of a subscription.
pub type EventReceiver = mpsc::UnboundedReceiver<ScanEvent>;

/// Fan-out bus for [`ScanEvent`]s.
///
/// Cheap to clone; clones share the same subscriber list.
///
/// # Example
///
/// ```rust
/// use surveyor_core::WorkerId;
/// use surveyor_engine::{EventBus, ScanEvent};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let bus = EventBus::new();
/// let mut receiver = bus.subscribe();
///
/// bus.emit(ScanEvent::WorkerStarted {
///     worker: WorkerId::new("dns/lookup").expect("valid worker ID"),
/// });
///
/// let event = receiver.recv().await.expect("event");
/// assert_eq!(event.name(), "worker_started");
/// # }
/// ```
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<ScanEvent>>>>,
}

impl EventBus {
    /// Create a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to every live subscriber.
    ///
    /// Subscribers whose receiver has been dropped are pruned. Returns the
    /// number of subscribers that received the event.
    pub fn emit(&self, event: ScanEvent) -> usize {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        subscribers.retain(|sender| sender.send(event.clone()).is_ok());
        subscribers.len()
    }

    /// Subscribe to events emitted from now on.
    #[must_use]
    pub fn subscribe(&self) -> EventReceiver {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sender);
        receiver
    }

    /// Number of subscribers that have not been pruned yet.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|sender| !sender.is_closed())
            .count()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discovered(raw: &str) -> ScanEvent {
        ScanEvent::ValueDiscovered {
            value: Arc::new(Value::classify(raw).expect("classifiable value")),
            parent: None,
        }
    }

    #[tokio::test]
    async fn test_emit_without_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.emit(discovered("example.com")), 0);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_every_subscriber_gets_every_event_in_order() {
        let bus = EventBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        for raw in ["a.example.com", "b.example.com", "c.example.com"] {
            assert_eq!(bus.emit(discovered(raw)), 2);
        }

        for receiver in [&mut first, &mut second] {
            let mut seen = Vec::new();
            while let Ok(ScanEvent::ValueDiscovered { value, .. }) = receiver.try_recv() {
                seen.push(value.canonical().to_string());
            }
            assert_eq!(seen, vec!["a.example.com", "b.example.com", "c.example.com"]);
        }
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_earlier_events() {
        let bus = EventBus::new();
        bus.emit(discovered("early.example.com"));

        let mut receiver = bus.subscribe();
        bus.emit(discovered("late.example.com"));

        match receiver.recv().await.expect("event") {
            ScanEvent::ValueDiscovered { value, .. } => {
                assert_eq!(value.canonical(), "late.example.com");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dropped_subscribers_are_pruned() {
        let bus = EventBus::new();
        let kept = bus.subscribe();
        let dropped = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        drop(dropped);
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(bus.emit(discovered("example.com")), 1);

        drop(kept);
        assert_eq!(bus.emit(discovered("example.org")), 0);
    }

    #[test]
    fn test_clones_share_subscribers() {
        let bus = EventBus::new();
        let clone = bus.clone();
        let _receiver = clone.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
    }
}
