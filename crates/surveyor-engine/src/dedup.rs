//! Run-scoped deduplication of discovered facts.

use dashmap::DashSet;
use surveyor_core::DedupKey;

/// Set of dedup keys seen during one run.
///
/// Grows monotonically; there is no eviction. Shared between the scheduler
/// and every job of the run.
#[derive(Debug, Default)]
pub struct DedupStore {
    seen: DashSet<DedupKey>,
}

impl DedupStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key`, returning `true` iff it was not already present.
    ///
    /// The check and the insert happen under one shard lock, so of several
    /// callers racing on the same key exactly one sees `true`.
    pub fn test_and_insert(&self, key: &DedupKey) -> bool {
        self.seen.insert(key.clone())
    }

    /// Whether `key` has been recorded.
    #[must_use]
    pub fn contains(&self, key: &DedupKey) -> bool {
        self.seen.contains(key)
    }

    /// Number of distinct keys recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
