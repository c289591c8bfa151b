//! ID sequencer for the metadata catalog
//!
//! This crate assigns and resolves the catalog's identifiers:
//! - CommittedIndex: ordered metric name → ID tree for flushed names
//! - YoungTier: assignments made since the last flush, plus the sequences
//! - IdSequencer: get/gen operations, recovery, flush and suggestions
//!
//! # Tiers
//!
//! ```text
//! gen_*  ──► young tier ──(flush)──► durable families
//!                 │                        │
//!                 └──(name flush)──► committed index ◄──(recover)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod prefix_index;
pub mod sequencer;
mod young;

pub use prefix_index::CommittedIndex;
pub use sequencer::{CatalogStats, IdSequencer};
