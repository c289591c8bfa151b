//! Testing utilities for storage failure handling
//!
//! This module provides tools for testing how callers of the family
//! contract react to storage failures:
//!
//! - **FaultyFamily**: wraps a [`VersionedFamily`](crate::VersionedFamily)
//!   and fails snapshot reads, flusher adds or commits on demand
//!
//! # Example
//!
//! ```ignore
//! use tsid_storage::testing::{FaultPoint, FaultyFamily};
//!
//! let family = FaultyFamily::in_memory("meta");
//! family.inject(FaultPoint::FindReaders);
//! // every snapshot.find_readers() now fails with a storage error
//! family.heal_all();
//! ```

mod faulty;

pub use faulty::{FaultPoint, FaultyFamily};
