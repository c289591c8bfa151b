//! Identifier and descriptor types
//!
//! Metric IDs and tag-key IDs come from two catalog-wide sequences.
//! Field IDs are scoped to their metric and are dense within it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a metric name
pub type MetricId = u32;

/// Identifier of a (metric, tag key) pair, unique across the catalog
pub type TagKeyId = u32;

/// Identifier of a field, unique within its metric only
pub type FieldId = u16;

/// Longest tag key or field name the meta record layout can hold (1-byte length)
pub const MAX_NAME_LEN: usize = u8::MAX as usize;

/// Declared value type of a field
///
/// The wire tag (see [`FieldType::to_byte`]) is part of the durable record
/// layout and must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldType {
    /// Sum of all written values
    Sum,
    /// Minimum of all written values
    Min,
    /// Maximum of all written values
    Max,
    /// Last written value
    Gauge,
    /// Monotonic counter delta
    Increase,
    /// Pre-aggregated summary
    Summary,
    /// Bucketed histogram
    Histogram,
}

impl FieldType {
    /// Wire tag of this type
    pub fn to_byte(self) -> u8 {
        match self {
            FieldType::Sum => 1,
            FieldType::Min => 2,
            FieldType::Max => 3,
            FieldType::Gauge => 4,
            FieldType::Increase => 5,
            FieldType::Summary => 6,
            FieldType::Histogram => 7,
        }
    }

    /// Parse a wire tag; `None` for 0 and unknown tags
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(FieldType::Sum),
            2 => Some(FieldType::Min),
            3 => Some(FieldType::Max),
            4 => Some(FieldType::Gauge),
            5 => Some(FieldType::Increase),
            6 => Some(FieldType::Summary),
            7 => Some(FieldType::Histogram),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A tag key and its identifier under one metric
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagKeyMeta {
    /// Tag key as written by clients
    pub tag_key: String,
    /// Catalog-wide identifier
    pub tag_key_id: TagKeyId,
}

impl TagKeyMeta {
    /// Create a new descriptor
    pub fn new(tag_key: impl Into<String>, tag_key_id: TagKeyId) -> Self {
        Self {
            tag_key: tag_key.into(),
            tag_key_id,
        }
    }
}

/// A field of one metric
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMeta {
    /// Identifier within the metric
    pub field_id: FieldId,
    /// Declared value type, immutable once assigned
    pub field_type: FieldType,
    /// Field name as written by clients
    pub field_name: String,
}

impl FieldMeta {
    /// Create a new descriptor
    pub fn new(field_id: FieldId, field_type: FieldType, field_name: impl Into<String>) -> Self {
        Self {
            field_id,
            field_type,
            field_name: field_name.into(),
        }
    }
}
