//! FamilySnapshot: point-in-time view over a versioned family
//!
//! A snapshot pins the segment list as it was when the snapshot was taken.
//! Segments are immutable and shared through `Arc`, so pinning is a cheap
//! clone of the list rather than a copy of the data.
//!
//! # Design Notes
//!
//! - **Immutable**: segments committed after the snapshot are not visible
//! - **Thread-safe**: can be shared across threads
//! - **Scoped**: dropping the snapshot releases it; the family counts live
//!   snapshots so leaks show up in tests

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tsid_core::Result;

use crate::family::{FamilyKey, Reader, Snapshot};
use crate::versioned::{FamilyInner, Segment};

/// A pinned, immutable view of a [`VersionedFamily`](crate::VersionedFamily)
pub struct FamilySnapshot {
    /// Family version at snapshot time
    version: u64,
    /// Segments visible at that version, oldest first
    segments: Vec<Arc<Segment>>,
    /// Owning family, for release accounting
    inner: Arc<FamilyInner>,
}

impl FamilySnapshot {
    pub(crate) fn new(version: u64, segments: Vec<Arc<Segment>>, inner: Arc<FamilyInner>) -> Self {
        inner.active_snapshots.fetch_add(1, Ordering::SeqCst);
        Self {
            version,
            segments,
            inner,
        }
    }

    /// Number of segments pinned
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }
}

impl Snapshot for FamilySnapshot {
    fn find_readers(&self, key: FamilyKey) -> Result<Vec<Arc<dyn Reader>>> {
        Ok(self
            .segments
            .iter()
            .filter(|segment| segment.contains(key))
            .map(|segment| Arc::clone(segment) as Arc<dyn Reader>)
            .collect())
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Drop for FamilySnapshot {
    fn drop(&mut self) {
        self.inner.active_snapshots.fetch_sub(1, Ordering::SeqCst);
    }
}
