//! Storage layer for the metadata ID catalog
//!
//! This crate implements the durable side of the catalog:
//! - Family contract: snapshots, readers and flushers over u32 keys
//! - VersionedFamily: append-only segments with point-in-time snapshots
//! - Table files: one CRC-checked file per committed segment
//! - Record formats for metric name IDs and per-metric metadata
//! - Fault injection for exercising storage failure paths

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod family;
pub mod file_name;
pub mod format;
pub mod snapshot;
pub mod testing;
pub mod versioned;

pub use family::{Family, FamilyKey, Flusher, Reader, Snapshot};
pub use format::{
    MetaReader, MetricsMetaFlusher, MetricsMetaReader, NameIdFlusher, NameIdRecord, Sequences,
    METRIC_NAME_IDS_KEY,
};
pub use snapshot::FamilySnapshot;
pub use versioned::{Segment, SegmentFlusher, VersionedFamily};
