//! Catalog: a sequencer over two families in one data directory
//!
//! Directory layout:
//!
//! ```text
//! <dir>/
//! ├── tsid.toml          optional configuration
//! ├── name_ids/          metric name → ID records, 000001.sst ...
//! └── metrics_meta/      per-metric tag-key and field records
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;
use tsid_core::{CatalogConfig, Result};
use tsid_sequencer::IdSequencer;
use tsid_storage::VersionedFamily;

/// Subdirectory of the name-ID family
pub const NAME_IDS_DIR: &str = "name_ids";

/// Subdirectory of the metrics-meta family
pub const METRICS_META_DIR: &str = "metrics_meta";

/// A recovered ID sequencer together with the families it writes to
pub struct Catalog {
    dir: Option<PathBuf>,
    name_ids: VersionedFamily,
    metrics_meta: VersionedFamily,
    sequencer: IdSequencer,
}

impl Catalog {
    /// Open (or create) the catalog in `dir`
    ///
    /// Reads `<dir>/tsid.toml` when present, otherwise uses defaults.
    ///
    /// # Errors
    ///
    /// Returns a config error, an I/O error, or the recovery error.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let config = CatalogConfig::load_or_default(dir)?;
        Self::open_with_config(dir, config)
    }

    /// Open (or create) the catalog in `dir` with an explicit config
    ///
    /// # Errors
    ///
    /// Returns an I/O error or the recovery error.
    pub fn open_with_config(dir: impl AsRef<Path>, config: CatalogConfig) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let name_ids = VersionedFamily::open(NAME_IDS_DIR, dir.join(NAME_IDS_DIR))?;
        let metrics_meta = VersionedFamily::open(METRICS_META_DIR, dir.join(METRICS_META_DIR))?;
        let catalog = Self::with_families(Some(dir), config, name_ids, metrics_meta)?;

        let stats = catalog.sequencer.stats();
        info!(
            dir = ?catalog.dir,
            committed_metrics = stats.committed_metrics,
            metric_sequence = stats.metric_sequence,
            tag_key_sequence = stats.tag_key_sequence,
            "Opened catalog"
        );
        Ok(catalog)
    }

    /// Create a catalog whose families live only in memory
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an invalid config.
    pub fn in_memory(config: CatalogConfig) -> Result<Self> {
        Self::with_families(
            None,
            config,
            VersionedFamily::in_memory(NAME_IDS_DIR),
            VersionedFamily::in_memory(METRICS_META_DIR),
        )
    }

    fn with_families(
        dir: Option<PathBuf>,
        config: CatalogConfig,
        name_ids: VersionedFamily,
        metrics_meta: VersionedFamily,
    ) -> Result<Self> {
        let sequencer = IdSequencer::open(
            config,
            Arc::new(name_ids.clone()),
            Arc::new(metrics_meta.clone()),
        )?;
        Ok(Self {
            dir,
            name_ids,
            metrics_meta,
            sequencer,
        })
    }

    /// The catalog's sequencer
    pub fn sequencer(&self) -> &IdSequencer {
        &self.sequencer
    }

    /// Flush metrics meta, then metric names with the sequences
    ///
    /// The meta flush persists the sequences on its own before writing any
    /// record, so stopping between the two flushes loses only young names.
    ///
    /// # Errors
    ///
    /// Returns the first flush error; unflushed entries stay young.
    pub fn flush(&self) -> Result<()> {
        self.sequencer.flush_metrics_meta()?;
        self.sequencer.flush_name_ids()
    }

    /// Data directory, `None` for an in-memory catalog
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// The name-ID family
    pub fn name_ids_family(&self) -> &VersionedFamily {
        &self.name_ids
    }

    /// The metrics-meta family
    pub fn metrics_meta_family(&self) -> &VersionedFamily {
        &self.metrics_meta
    }
}
