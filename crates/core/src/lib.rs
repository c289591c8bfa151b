//! Core types for tsid
//!
//! This crate defines the foundational types shared by every layer:
//! - MetricId, TagKeyId, FieldId: identifier widths
//! - FieldType: declared value type of a field, with a stable wire tag
//! - TagKeyMeta, FieldMeta: per-metric tag-key and field descriptors
//! - Error: error taxonomy for lookups, allocation and storage
//! - CatalogConfig: limits that are configuration, not code

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod types;

pub use config::{CatalogConfig, CONFIG_FILE_NAME};
pub use error::{Error, Result};
pub use types::{FieldId, FieldMeta, FieldType, MetricId, TagKeyId, TagKeyMeta, MAX_NAME_LEN};
