//! Storage family contract
//!
//! A family is one independent keyspace of the segment store (the catalog
//! uses two: metric name IDs and metric meta). The catalog only ever sees a
//! family through these traits, so the store behind them can be replaced
//! without touching the sequencer.
//!
//! Thread safety: families, snapshots and readers are shared across
//! threads (`Send + Sync`). A flusher is owned by the single flush in
//! flight for its family.

use std::sync::Arc;

use tsid_core::Result;

/// Key type of every family: a metric ID or a fixed well-known key
pub type FamilyKey = u32;

/// One keyspace of the versioned segment store
pub trait Family: Send + Sync {
    /// Family name, used in logs and errors
    fn name(&self) -> &str;

    /// Pin the current set of segments
    ///
    /// The snapshot is released when the returned box is dropped.
    fn get_snapshot(&self) -> Box<dyn Snapshot>;

    /// Start a new segment writer
    fn new_flusher(&self) -> Box<dyn Flusher>;
}

/// Immutable point-in-time view over a family
pub trait Snapshot: Send + Sync {
    /// Readers (oldest first) of every segment that holds `key`
    ///
    /// # Errors
    ///
    /// Returns a storage error if the segment list cannot be resolved.
    fn find_readers(&self, key: FamilyKey) -> Result<Vec<Arc<dyn Reader>>>;

    /// Version of the family this snapshot pins
    fn version(&self) -> u64;
}

/// Read access to one immutable segment
pub trait Reader: Send + Sync {
    /// Value stored under `key`, if this segment has one
    fn get(&self, key: FamilyKey) -> Option<&[u8]>;
}

/// Buffered writer producing one new segment
pub trait Flusher: Send {
    /// Buffer a key/value pair for the pending segment
    ///
    /// # Errors
    ///
    /// Returns a storage error if the pair cannot be accepted.
    fn add(&mut self, key: FamilyKey, value: &[u8]) -> Result<()>;

    /// Make every buffered pair durable and visible to new snapshots
    ///
    /// Nothing becomes visible unless this returns `Ok`.
    fn commit(&mut self) -> Result<()>;
}
