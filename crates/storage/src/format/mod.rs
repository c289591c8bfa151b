//! On-disk byte formats for table files and catalog records.
//!
//! This module centralizes all serialization logic for persistent storage.
//! Keeping serialization separate from operational logic (how families are
//! versioned and flushed) makes format evolution easier to manage.
//!
//! # Module Structure
//!
//! - `table`: table file framing (magic, version, entries, CRC32)
//! - `varint`: unsigned LEB128 varints used inside records
//! - `name_id`: the compressed metric name → ID record with sequence trailer
//! - `metrics_meta`: per-metric tag-key and field records

pub mod metrics_meta;
pub mod name_id;
pub mod table;
pub mod varint;

pub use metrics_meta::{
    decode_metric_meta, encode_metric_meta, MetaReader, MetricMetaRecord, MetricsMetaFlusher,
    MetricsMetaReader,
};
pub use name_id::{
    decode_name_ids, encode_name_ids, NameIdFlusher, NameIdRecord, Sequences,
    METRIC_NAME_IDS_KEY, SEQUENCE_TRAILER_LEN,
};
pub use table::{TableError, TABLE_FORMAT_VERSION, TABLE_MAGIC};
