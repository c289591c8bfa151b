//! IdSequencer: assigns and resolves metric, tag-key and field IDs
//!
//! Lookups consult the young tier first, then the committed index (metric
//! names) or a snapshot of the meta family (tag keys and fields).
//! Allocations are idempotent and hand out the next sequence value only when
//! a name is found in neither tier.
//!
//! # Design Notes
//!
//! - **One young lock**: the young maps and both sequences sit behind a single
//!   `parking_lot::Mutex`, so a lookup-then-allocate is one critical section
//! - **Durable reads outside the lock**: tag-key and field fall-throughs read
//!   the meta family unlocked, then re-check the young tier under the lock; a
//!   meta flush that raced the read bumps `meta_generation` and the read is
//!   repeated
//! - **Promote before remove**: a name flush inserts into the committed index
//!   before dropping the young entry, so every name is visible somewhere
//! - **One flush per family**: each family has its own flush mutex; flushes
//!   never block allocation
//! - **Sequences ride with meta**: a meta flush commits a sequences-only
//!   name-ID record before any meta record, so recovery never reissues a
//!   tag-key ID that is already on disk

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};
use tsid_core::{
    CatalogConfig, Error, FieldId, FieldMeta, FieldType, MetricId, Result, TagKeyId, TagKeyMeta,
    MAX_NAME_LEN,
};
use tsid_storage::format::{decode_name_ids, MetricsMetaReader};
use tsid_storage::{
    Family, MetaReader, MetricsMetaFlusher, NameIdFlusher, Sequences, METRIC_NAME_IDS_KEY,
};

use crate::prefix_index::CommittedIndex;
use crate::young::YoungTier;

/// Point-in-time counters of a sequencer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogStats {
    /// Metric names not yet flushed
    pub young_metrics: usize,
    /// Tag keys not yet flushed
    pub young_tag_keys: usize,
    /// Fields not yet flushed
    pub young_fields: usize,
    /// Metric names in the committed index
    pub committed_metrics: usize,
    /// Last allocated metric ID
    pub metric_sequence: MetricId,
    /// Last allocated tag-key ID
    pub tag_key_sequence: TagKeyId,
}

/// Result of a durable field lookup
enum StoredField {
    Found(FieldId, FieldType),
    Missing { max_field_id: FieldId },
}

/// The catalog's ID sequencer
///
/// Both families are supplied by the caller and outlive the sequencer.
pub struct IdSequencer {
    config: CatalogConfig,
    name_ids_family: Arc<dyn Family>,
    meta_family: Arc<dyn Family>,
    committed: CommittedIndex,
    young: Mutex<YoungTier>,
    name_flush_lock: Mutex<()>,
    meta_flush_lock: Mutex<()>,
}

impl IdSequencer {
    /// Create a sequencer over two families and recover it
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an invalid config, or the recovery error.
    pub fn open(
        config: CatalogConfig,
        name_ids_family: Arc<dyn Family>,
        meta_family: Arc<dyn Family>,
    ) -> Result<Self> {
        config.validate()?;
        let sequencer = Self {
            config,
            name_ids_family,
            meta_family,
            committed: CommittedIndex::new(),
            young: Mutex::new(YoungTier::default()),
            name_flush_lock: Mutex::new(()),
            meta_flush_lock: Mutex::new(()),
        };
        sequencer.recover()?;
        Ok(sequencer)
    }

    /// Configuration in effect
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    // ========================================================================
    // Recovery
    // ========================================================================

    /// Load committed names and sequences from the name-ID family
    ///
    /// Every record is decoded before anything is applied, so a corrupt
    /// record leaves the sequencer as it was. Sequences only move up.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the snapshot cannot be read and
    /// `Corruption` if a record does not decode.
    pub fn recover(&self) -> Result<()> {
        let snapshot = self.name_ids_family.get_snapshot();
        let readers = snapshot.find_readers(METRIC_NAME_IDS_KEY)?;

        let mut records = Vec::with_capacity(readers.len());
        for reader in &readers {
            if let Some(value) = reader.get(METRIC_NAME_IDS_KEY) {
                records.push(decode_name_ids(value)?);
            }
        }
        drop(snapshot);

        let mut sequences = Sequences::default();
        let mut names = 0;
        for record in records {
            sequences = sequences.max(record.sequences);
            names += record.name_ids.len();
            self.committed.extend(record.name_ids);
        }

        let mut young = self.young.lock();
        young.sequences = young.sequences.max(sequences);
        info!(
            family = self.name_ids_family.name(),
            segments = readers.len(),
            names,
            committed = self.committed.len(),
            metric_sequence = young.sequences.metric_id,
            tag_key_sequence = young.sequences.tag_key_id,
            "Recovered metric name IDs"
        );
        Ok(())
    }

    // ========================================================================
    // Metric IDs
    // ========================================================================

    /// ID of metric `name`
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the name is neither young nor committed.
    pub fn get_metric_id(&self, name: &str) -> Result<MetricId> {
        if let Some(&id) = self.young.lock().metric_ids.get(name) {
            return Ok(id);
        }
        // A name missing from the young map was either never created or has
        // already been promoted.
        self.committed
            .get(name)
            .ok_or_else(|| Error::not_found(format!("metric {}", name)))
    }

    /// ID of metric `name`, allocating one if it is new
    ///
    /// Any name is accepted.
    ///
    /// # Errors
    ///
    /// Returns `IdSpaceExhausted` if the name is new and the metric sequence
    /// is already at `u32::MAX`.
    pub fn gen_metric_id(&self, name: &str) -> Result<MetricId> {
        let mut young = self.young.lock();
        if let Some(&id) = young.metric_ids.get(name) {
            return Ok(id);
        }
        if let Some(id) = self.committed.get(name) {
            return Ok(id);
        }
        let id = young.next_metric_id()?;
        young.metric_ids.insert(name.to_string(), id);
        debug!(metric = name, metric_id = id, "Allocated metric ID");
        Ok(id)
    }

    // ========================================================================
    // Tag-key IDs
    // ========================================================================

    /// ID of `tag_key` under `metric_id`
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no tier has the pair, or the storage error of the
    /// durable lookup.
    pub fn get_tag_id(&self, metric_id: MetricId, tag_key: &str) -> Result<TagKeyId> {
        if let Some(id) = self.young.lock().tag_id(metric_id, tag_key) {
            return Ok(id);
        }
        self.read_meta(metric_id, |reader| reader.read_tag_id(metric_id, tag_key))?
            .ok_or_else(|| Error::not_found(format!("tag key {} of metric {}", tag_key, metric_id)))
    }

    /// ID of `tag_key` under `metric_id`, allocating one if it is new
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty or over-long key,
    /// `IdSpaceExhausted` when a new key finds the tag-key sequence at
    /// `u32::MAX`, and storage errors of the durable lookup.
    pub fn gen_tag_id(&self, metric_id: MetricId, tag_key: &str) -> Result<TagKeyId> {
        validate_name("tag key", tag_key)?;
        loop {
            let generation = {
                let young = self.young.lock();
                if let Some(id) = young.tag_id(metric_id, tag_key) {
                    return Ok(id);
                }
                young.meta_generation
            };

            let stored =
                self.read_meta(metric_id, |reader| reader.read_tag_id(metric_id, tag_key))?;

            let mut young = self.young.lock();
            if young.meta_generation != generation {
                continue;
            }
            if let Some(id) = stored.or_else(|| young.tag_id(metric_id, tag_key)) {
                return Ok(id);
            }
            let id = young.next_tag_key_id()?;
            young
                .tag_keys
                .entry(metric_id)
                .or_default()
                .push(TagKeyMeta::new(tag_key, id));
            debug!(metric_id, tag_key, tag_key_id = id, "Allocated tag key ID");
            return Ok(id);
        }
    }

    // ========================================================================
    // Field IDs
    // ========================================================================

    /// ID and type of `field_name` under `metric_id`
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no tier has the field, or the storage error of
    /// the durable lookup.
    pub fn get_field_id(
        &self,
        metric_id: MetricId,
        field_name: &str,
    ) -> Result<(FieldId, FieldType)> {
        if let Some(field) = self.young.lock().field(metric_id, field_name) {
            return Ok((field.field_id, field.field_type));
        }
        self.read_meta(metric_id, |reader| reader.read_field_id(metric_id, field_name))?
            .ok_or_else(|| {
                Error::not_found(format!("field {} of metric {}", field_name, metric_id))
            })
    }

    /// ID of `field_name` under `metric_id`, allocating one if it is new
    ///
    /// A new field gets one above the highest field ID the metric has in
    /// either tier.
    ///
    /// # Errors
    ///
    /// - `FieldTypeConflict` if the field exists with another type
    /// - `TooManyFields` if the next ID would exceed `max_fields_per_metric`
    /// - `InvalidInput` for an empty or over-long name
    /// - storage errors of the durable lookup
    pub fn gen_field_id(
        &self,
        metric_id: MetricId,
        field_name: &str,
        field_type: FieldType,
    ) -> Result<FieldId> {
        validate_name("field name", field_name)?;
        loop {
            let generation = {
                let young = self.young.lock();
                if let Some(field) = young.field(metric_id, field_name) {
                    return check_field_type(
                        field_name,
                        field.field_id,
                        field.field_type,
                        field_type,
                    );
                }
                young.meta_generation
            };

            let stored = self.read_meta(metric_id, |reader| {
                Ok(match reader.read_field_id(metric_id, field_name)? {
                    Some((id, stored_type)) => StoredField::Found(id, stored_type),
                    None => StoredField::Missing {
                        max_field_id: reader.read_max_field_id(metric_id)?,
                    },
                })
            })?;

            let mut young = self.young.lock();
            if young.meta_generation != generation {
                continue;
            }
            let durable_max = match stored {
                StoredField::Found(id, stored_type) => {
                    return check_field_type(field_name, id, stored_type, field_type);
                }
                StoredField::Missing { max_field_id } => max_field_id,
            };
            if let Some(field) = young.field(metric_id, field_name) {
                return check_field_type(field_name, field.field_id, field.field_type, field_type);
            }

            let limit = self.config.max_fields_per_metric;
            let candidate = u32::from(durable_max.max(young.max_field_id(metric_id))) + 1;
            if candidate > u32::from(limit) {
                warn!(metric_id, field = field_name, limit, "Field limit reached");
                return Err(Error::TooManyFields { metric_id, limit });
            }
            // candidate <= limit, and limit is a u16
            let id = candidate as FieldId;
            young
                .fields
                .entry(metric_id)
                .or_default()
                .push(FieldMeta::new(id, field_type, field_name));
            debug!(
                metric_id,
                field = field_name,
                field_id = id,
                field_type = %field_type,
                "Allocated field ID"
            );
            return Ok(id);
        }
    }

    // ========================================================================
    // Flush
    // ========================================================================

    /// Persist young metric names together with both sequences
    ///
    /// A record is written even with no young names, so the sequences reach
    /// storage. On success the flushed names move to the committed index.
    ///
    /// # Errors
    ///
    /// Returns the flusher's error; the young tier is left untouched.
    pub fn flush_name_ids(&self) -> Result<()> {
        let _flush = self.name_flush_lock.lock();
        let (name_ids, sequences) = {
            let young = self.young.lock();
            (young.sorted_name_ids(), young.sequences)
        };

        let mut flusher = NameIdFlusher::new(self.name_ids_family.new_flusher());
        flusher.flush_name_ids(&name_ids, sequences)?;
        flusher.commit()?;

        self.committed.extend(name_ids.iter().cloned());
        self.young.lock().remove_flushed_names(&name_ids);
        info!(
            family = self.name_ids_family.name(),
            names = name_ids.len(),
            metric_sequence = sequences.metric_id,
            tag_key_sequence = sequences.tag_key_id,
            "Flushed metric name IDs"
        );
        Ok(())
    }

    /// Persist young tag keys and fields, one record per metric
    ///
    /// Nothing is written when the young meta maps are empty. Otherwise a
    /// name-ID record carrying only the sequences is committed first, so the
    /// tag-key sequence on disk covers every tag-key ID in the meta records
    /// even if no name flush follows. On success the persisted entries leave
    /// the young tier; entries allocated while the flush was writing stay
    /// young.
    ///
    /// # Errors
    ///
    /// Returns the flusher's error; the young tier is left untouched.
    pub fn flush_metrics_meta(&self) -> Result<()> {
        let _flush = self.meta_flush_lock.lock();
        let (pending, sequences) = {
            let young = self.young.lock();
            (young.pending_meta(), young.sequences)
        };
        if pending.is_empty() {
            return Ok(());
        }

        {
            let _names = self.name_flush_lock.lock();
            let mut flusher = NameIdFlusher::new(self.name_ids_family.new_flusher());
            flusher.flush_name_ids(&[], sequences)?;
            flusher.commit()?;
        }
        debug!(
            family = self.name_ids_family.name(),
            metric_sequence = sequences.metric_id,
            tag_key_sequence = sequences.tag_key_id,
            "Persisted sequences ahead of metrics meta"
        );

        let mut flusher = MetricsMetaFlusher::new(self.meta_family.new_flusher());
        for meta in &pending {
            flusher.flush_metric_meta(meta.metric_id, &meta.tag_keys, &meta.fields)?;
        }
        flusher.commit()?;

        let tag_keys: usize = pending.iter().map(|m| m.tag_keys.len()).sum();
        let fields: usize = pending.iter().map(|m| m.fields.len()).sum();
        self.young.lock().remove_flushed_meta(&pending);
        info!(
            family = self.meta_family.name(),
            metrics = pending.len(),
            tag_keys,
            fields,
            "Flushed metrics meta"
        );
        Ok(())
    }

    // ========================================================================
    // Suggestions
    // ========================================================================

    /// Committed metric names starting with `prefix`, sorted
    ///
    /// At most `min(limit, max_suggestions)` names; `limit == 0` yields none.
    pub fn suggest_metrics(&self, prefix: &str, limit: usize) -> Vec<String> {
        self.committed.suggest(prefix, self.suggestion_limit(limit))
    }

    /// Stored tag keys of `metric_name` starting with `prefix`, sorted
    ///
    /// An unknown metric or a failed storage read yields an empty list.
    pub fn suggest_tag_keys(&self, metric_name: &str, prefix: &str, limit: usize) -> Vec<String> {
        let limit = self.suggestion_limit(limit);
        if limit == 0 {
            return Vec::new();
        }
        let metric_id = match self.get_metric_id(metric_name) {
            Ok(id) => id,
            Err(e) if e.is_not_found() => return Vec::new(),
            Err(e) => {
                warn!(metric = metric_name, error = %e, "Tag key suggestion failed");
                return Vec::new();
            }
        };
        match self.read_meta(metric_id, |reader| {
            reader.suggest_tag_keys(metric_id, prefix, limit)
        }) {
            Ok(keys) => keys,
            Err(e) => {
                warn!(
                    metric = metric_name,
                    metric_id,
                    prefix,
                    error = %e,
                    "Tag key suggestion failed"
                );
                Vec::new()
            }
        }
    }

    fn suggestion_limit(&self, limit: usize) -> usize {
        limit.min(self.config.max_suggestions)
    }

    // ========================================================================
    // Stats
    // ========================================================================

    /// Current tier sizes and sequence values
    pub fn stats(&self) -> CatalogStats {
        let young = self.young.lock();
        CatalogStats {
            young_metrics: young.metric_ids.len(),
            young_tag_keys: young.tag_key_count(),
            young_fields: young.field_count(),
            committed_metrics: self.committed.len(),
            metric_sequence: young.sequences.metric_id,
            tag_key_sequence: young.sequences.tag_key_id,
        }
    }

    /// Run `read` over the meta records of `metric_id` in a fresh snapshot
    ///
    /// The snapshot is released when this returns, on every path.
    fn read_meta<T>(
        &self,
        metric_id: MetricId,
        read: impl FnOnce(&MetaReader) -> Result<T>,
    ) -> Result<T> {
        let snapshot = self.meta_family.get_snapshot();
        let reader = MetaReader::new(snapshot.find_readers(metric_id)?);
        read(&reader)
    }
}

fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_input(format!("{} must not be empty", kind)));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(Error::invalid_input(format!(
            "{} is {} bytes, limit is {}",
            kind,
            name.len(),
            MAX_NAME_LEN
        )));
    }
    Ok(())
}

fn check_field_type(
    field_name: &str,
    field_id: FieldId,
    existing: FieldType,
    requested: FieldType,
) -> Result<FieldId> {
    if existing == requested {
        Ok(field_id)
    } else {
        Err(Error::FieldTypeConflict {
            field: field_name.to_string(),
            existing,
            requested,
        })
    }
}
