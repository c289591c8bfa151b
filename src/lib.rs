//! tsid - metadata-ID catalog for a time-series storage engine
//!
//! tsid hands out compact, stable integer IDs for metric names, per-metric
//! tag keys and per-metric fields, and keeps them durable in a versioned
//! segment store.
//!
//! # Quick Start
//!
//! ```ignore
//! use tsid::{Catalog, FieldType};
//!
//! let catalog = Catalog::open("/var/lib/tsdb/catalog")?;
//! let ids = catalog.sequencer();
//!
//! let cpu = ids.gen_metric_id("cpu")?;
//! let host = ids.gen_tag_id(cpu, "host")?;
//! let usage = ids.gen_field_id(cpu, "usage", FieldType::Gauge)?;
//!
//! // Persist everything allocated so far
//! catalog.flush()?;
//! ```
//!
//! # Architecture
//!
//! - `tsid-core`: identifier types, errors, configuration
//! - `tsid-storage`: family contract, versioned segment family, record formats
//! - `tsid-sequencer`: the [`IdSequencer`] and its tiers

#![warn(missing_docs)]
#![warn(clippy::all)]

mod catalog;

pub use catalog::{Catalog, METRICS_META_DIR, NAME_IDS_DIR};

pub use tsid_core::{
    CatalogConfig, Error, FieldId, FieldMeta, FieldType, MetricId, Result, TagKeyId, TagKeyMeta,
    CONFIG_FILE_NAME,
};
pub use tsid_sequencer::{CatalogStats, IdSequencer};
pub use tsid_storage::{Family, VersionedFamily};
