//! Committed metric name index
//!
//! Holds every metric name that has reached durable storage, either loaded
//! by recovery or promoted by a name flush. Entries are never removed.
//!
//! Prefix queries walk the ordered tree from the prefix and stop at the first
//! name that no longer starts with it, so results come out sorted.

use std::collections::BTreeMap;
use std::ops::Bound;

use parking_lot::RwLock;
use tsid_core::MetricId;

/// Ordered, read-mostly map of committed metric names to IDs
#[derive(Debug, Default)]
pub struct CommittedIndex {
    names: RwLock<BTreeMap<String, MetricId>>,
}

impl CommittedIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// ID of `name`, if committed
    pub fn get(&self, name: &str) -> Option<MetricId> {
        self.names.read().get(name).copied()
    }

    /// Add one name
    pub fn insert(&self, name: impl Into<String>, metric_id: MetricId) {
        self.names.write().insert(name.into(), metric_id);
    }

    /// Add many names under a single write lock
    pub fn extend<I>(&self, name_ids: I)
    where
        I: IntoIterator<Item = (String, MetricId)>,
    {
        self.names.write().extend(name_ids);
    }

    /// Up to `limit` committed names starting with `prefix`, in lexicographic order
    pub fn suggest(&self, prefix: &str, limit: usize) -> Vec<String> {
        if limit == 0 {
            return Vec::new();
        }
        let names = self.names.read();
        names
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(name, _)| name.starts_with(prefix))
            .take(limit)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Number of committed names
    pub fn len(&self) -> usize {
        self.names.read().len()
    }

    /// True if nothing has been committed
    pub fn is_empty(&self) -> bool {
        self.names.read().is_empty()
    }
}
