//! Young tier: assignments not yet flushed
//!
//! Per-metric lists are append-only between flushes and only a flush removes
//! from them, always from the front. A flush that persisted the first `n`
//! entries of a list can therefore drop exactly those `n` even if more were
//! appended while it was writing.

use rustc_hash::FxHashMap;
use tsid_core::{Error, FieldId, FieldMeta, MetricId, Result, TagKeyId, TagKeyMeta};
use tsid_storage::Sequences;

/// Meta entries of one metric captured for a flush
#[derive(Debug, Clone)]
pub(crate) struct PendingMeta {
    pub(crate) metric_id: MetricId,
    pub(crate) tag_keys: Vec<TagKeyMeta>,
    pub(crate) fields: Vec<FieldMeta>,
}

/// Unflushed assignments and the sequence counters
#[derive(Debug, Default)]
pub(crate) struct YoungTier {
    pub(crate) metric_ids: FxHashMap<String, MetricId>,
    pub(crate) tag_keys: FxHashMap<MetricId, Vec<TagKeyMeta>>,
    pub(crate) fields: FxHashMap<MetricId, Vec<FieldMeta>>,
    pub(crate) sequences: Sequences,
    /// Bumped every time a meta flush removes entries
    pub(crate) meta_generation: u64,
}

impl YoungTier {
    pub(crate) fn tag_id(&self, metric_id: MetricId, tag_key: &str) -> Option<TagKeyId> {
        self.tag_keys
            .get(&metric_id)?
            .iter()
            .find(|t| t.tag_key == tag_key)
            .map(|t| t.tag_key_id)
    }

    pub(crate) fn field(&self, metric_id: MetricId, field_name: &str) -> Option<&FieldMeta> {
        self.fields
            .get(&metric_id)?
            .iter()
            .find(|f| f.field_name == field_name)
    }

    /// Highest young field ID of `metric_id`, 0 when it has none
    pub(crate) fn max_field_id(&self, metric_id: MetricId) -> FieldId {
        self.fields
            .get(&metric_id)
            .and_then(|fields| fields.iter().map(|f| f.field_id).max())
            .unwrap_or(0)
    }

    /// Advance the metric sequence; a sequence at `u32::MAX` stays put
    pub(crate) fn next_metric_id(&mut self) -> Result<MetricId> {
        self.sequences.metric_id = self
            .sequences
            .metric_id
            .checked_add(1)
            .ok_or(Error::IdSpaceExhausted("metric"))?;
        Ok(self.sequences.metric_id)
    }

    /// Advance the tag-key sequence; a sequence at `u32::MAX` stays put
    pub(crate) fn next_tag_key_id(&mut self) -> Result<TagKeyId> {
        self.sequences.tag_key_id = self
            .sequences
            .tag_key_id
            .checked_add(1)
            .ok_or(Error::IdSpaceExhausted("tag key"))?;
        Ok(self.sequences.tag_key_id)
    }

    /// Young name/ID pairs sorted by name
    pub(crate) fn sorted_name_ids(&self) -> Vec<(String, MetricId)> {
        let mut name_ids: Vec<(String, MetricId)> = self
            .metric_ids
            .iter()
            .map(|(name, id)| (name.clone(), *id))
            .collect();
        name_ids.sort_unstable();
        name_ids
    }

    pub(crate) fn remove_flushed_names(&mut self, flushed: &[(String, MetricId)]) {
        for (name, _) in flushed {
            self.metric_ids.remove(name);
        }
    }

    /// One entry per metric with young tag keys or fields, ordered by metric ID
    pub(crate) fn pending_meta(&self) -> Vec<PendingMeta> {
        let mut metric_ids: Vec<MetricId> = self
            .tag_keys
            .keys()
            .chain(self.fields.keys())
            .copied()
            .collect();
        metric_ids.sort_unstable();
        metric_ids.dedup();

        metric_ids
            .into_iter()
            .map(|metric_id| PendingMeta {
                metric_id,
                tag_keys: self.tag_keys.get(&metric_id).cloned().unwrap_or_default(),
                fields: self.fields.get(&metric_id).cloned().unwrap_or_default(),
            })
            .collect()
    }

    pub(crate) fn remove_flushed_meta(&mut self, flushed: &[PendingMeta]) {
        for pending in flushed {
            drain_front(&mut self.tag_keys, pending.metric_id, pending.tag_keys.len());
            drain_front(&mut self.fields, pending.metric_id, pending.fields.len());
        }
        self.meta_generation += 1;
    }

    pub(crate) fn tag_key_count(&self) -> usize {
        self.tag_keys.values().map(Vec::len).sum()
    }

    pub(crate) fn field_count(&self) -> usize {
        self.fields.values().map(Vec::len).sum()
    }
}

fn drain_front<T>(map: &mut FxHashMap<MetricId, Vec<T>>, metric_id: MetricId, n: usize) {
    if n == 0 {
        return;
    }
    if let Some(list) = map.get_mut(&metric_id) {
        list.drain(..n.min(list.len()));
        if list.is_empty() {
            map.remove(&metric_id);
        }
    }
}
