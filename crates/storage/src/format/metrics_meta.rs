//! Metric meta record format
//!
//! The meta family stores, under each metric ID, the tag keys and fields
//! that one flush persisted for that metric. A metric flushed several times
//! has one record per segment; readers merge across segments.
//!
//! # Format
//!
//! ```text
//! +--------------------------------------------+
//! | Tag Meta Length     | uvarint              |
//! |   Tag Key Length    | 1 byte               |
//! |   Tag Key           | N bytes (UTF-8)      |
//! |   Tag Key ID        | 4 bytes (u32 LE)     |
//! |   ... repeated per tag key                 |
//! | Field Meta Length   | uvarint              |
//! |   Field Name Length | 1 byte               |
//! |   Field Name        | N bytes (UTF-8)      |
//! |   Field Type        | 1 byte (wire tag)    |
//! |   Field ID          | 2 bytes (u16 LE)     |
//! |   ... repeated per field                   |
//! +--------------------------------------------+
//! ```

use std::collections::BTreeSet;
use std::io::{Cursor, Read};
use std::sync::Arc;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use tsid_core::{
    Error, FieldId, FieldMeta, FieldType, MetricId, Result, TagKeyId, TagKeyMeta, MAX_NAME_LEN,
};

use super::varint::{put_uvarint, read_uvarint};
use crate::family::{Flusher, Reader};

/// Decoded content of one metric meta record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricMetaRecord {
    /// Tag keys in record order
    pub tag_keys: Vec<TagKeyMeta>,
    /// Fields in record order
    pub fields: Vec<FieldMeta>,
}

fn put_short_name(buf: &mut Vec<u8>, name: &str) -> Result<()> {
    if name.len() > MAX_NAME_LEN {
        return Err(Error::invalid_input(format!(
            "name of {} bytes exceeds {} bytes",
            name.len(),
            MAX_NAME_LEN
        )));
    }
    buf.push(name.len() as u8);
    buf.extend_from_slice(name.as_bytes());
    Ok(())
}

fn read_short_name(cursor: &mut Cursor<&[u8]>, end: u64) -> Result<String> {
    let len = cursor
        .read_u8()
        .map_err(|_| Error::corruption("truncated name length"))? as u64;
    if cursor.position() + len > end {
        return Err(Error::corruption("name runs past end of block"));
    }
    let mut name = vec![0u8; len as usize];
    cursor.read_exact(&mut name)?;
    String::from_utf8(name).map_err(|_| Error::corruption("name is not valid UTF-8"))
}

/// Serialize the tag keys and fields of one metric
///
/// # Errors
///
/// Returns `InvalidInput` if a tag key or field name is longer than 255 bytes.
pub fn encode_metric_meta(tag_keys: &[TagKeyMeta], fields: &[FieldMeta]) -> Result<Vec<u8>> {
    let mut tag_block = Vec::new();
    for tag in tag_keys {
        put_short_name(&mut tag_block, &tag.tag_key)?;
        tag_block.write_u32::<LittleEndian>(tag.tag_key_id)?;
    }

    let mut field_block = Vec::new();
    for field in fields {
        put_short_name(&mut field_block, &field.field_name)?;
        field_block.write_u8(field.field_type.to_byte())?;
        field_block.write_u16::<LittleEndian>(field.field_id)?;
    }

    let mut value = Vec::with_capacity(tag_block.len() + field_block.len() + 4);
    put_uvarint(&mut value, tag_block.len() as u64);
    value.extend_from_slice(&tag_block);
    put_uvarint(&mut value, field_block.len() as u64);
    value.extend_from_slice(&field_block);
    Ok(value)
}

/// Deserialize one metric meta record
///
/// # Errors
///
/// Returns `Corruption` on truncated blocks, invalid names or unknown field
/// type tags.
pub fn decode_metric_meta(value: &[u8]) -> Result<MetricMetaRecord> {
    let total = value.len() as u64;
    let mut cursor = Cursor::new(value);
    let mut record = MetricMetaRecord::default();

    let tag_len = read_uvarint(&mut cursor)?;
    let tag_end = cursor
        .position()
        .checked_add(tag_len)
        .filter(|&end| end <= total)
        .ok_or_else(|| Error::corruption("tag meta block runs past end of record"))?;
    while cursor.position() < tag_end {
        let tag_key = read_short_name(&mut cursor, tag_end)?;
        if cursor.position() + 4 > tag_end {
            return Err(Error::corruption("truncated tag key id"));
        }
        let tag_key_id = cursor.read_u32::<LittleEndian>()?;
        record.tag_keys.push(TagKeyMeta {
            tag_key,
            tag_key_id,
        });
    }

    let field_len = read_uvarint(&mut cursor)?;
    let field_end = cursor.position().saturating_add(field_len);
    if field_end != total {
        return Err(Error::corruption(
            "field meta block does not end the record",
        ));
    }
    while cursor.position() < field_end {
        let field_name = read_short_name(&mut cursor, field_end)?;
        if cursor.position() + 3 > field_end {
            return Err(Error::corruption("truncated field descriptor"));
        }
        let tag = cursor.read_u8()?;
        let field_type = FieldType::from_byte(tag)
            .ok_or_else(|| Error::corruption(format!("unknown field type tag {}", tag)))?;
        let field_id = cursor.read_u16::<LittleEndian>()?;
        record.fields.push(FieldMeta {
            field_id,
            field_type,
            field_name,
        });
    }

    Ok(record)
}

/// Queries over the meta records of a snapshot
pub trait MetricsMetaReader {
    /// ID of `tag_key` under `metric_id`, if stored
    fn read_tag_id(&self, metric_id: MetricId, tag_key: &str) -> Result<Option<TagKeyId>>;

    /// ID and type of `field_name` under `metric_id`, if stored
    fn read_field_id(
        &self,
        metric_id: MetricId,
        field_name: &str,
    ) -> Result<Option<(FieldId, FieldType)>>;

    /// Highest stored field ID of `metric_id`, 0 when it has none
    fn read_max_field_id(&self, metric_id: MetricId) -> Result<FieldId>;

    /// Stored tag keys of `metric_id` starting with `prefix`, sorted, at most `limit`
    fn suggest_tag_keys(
        &self,
        metric_id: MetricId,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<String>>;
}

/// [`MetricsMetaReader`] over the readers a snapshot returned for one metric
pub struct MetaReader {
    readers: Vec<Arc<dyn Reader>>,
}

impl MetaReader {
    /// Wrap snapshot readers (oldest first)
    pub fn new(readers: Vec<Arc<dyn Reader>>) -> Self {
        Self { readers }
    }

    /// Decoded records of `metric_id`, newest first
    fn records(&self, metric_id: MetricId) -> impl Iterator<Item = Result<MetricMetaRecord>> + '_ {
        self.readers
            .iter()
            .rev()
            .filter_map(move |reader| reader.get(metric_id))
            .map(decode_metric_meta)
    }
}

impl MetricsMetaReader for MetaReader {
    fn read_tag_id(&self, metric_id: MetricId, tag_key: &str) -> Result<Option<TagKeyId>> {
        for record in self.records(metric_id) {
            if let Some(tag) = record?.tag_keys.iter().find(|t| t.tag_key == tag_key) {
                return Ok(Some(tag.tag_key_id));
            }
        }
        Ok(None)
    }

    fn read_field_id(
        &self,
        metric_id: MetricId,
        field_name: &str,
    ) -> Result<Option<(FieldId, FieldType)>> {
        for record in self.records(metric_id) {
            if let Some(field) = record?.fields.iter().find(|f| f.field_name == field_name) {
                return Ok(Some((field.field_id, field.field_type)));
            }
        }
        Ok(None)
    }

    fn read_max_field_id(&self, metric_id: MetricId) -> Result<FieldId> {
        let mut max = 0;
        for record in self.records(metric_id) {
            if let Some(id) = record?.fields.iter().map(|f| f.field_id).max() {
                max = max.max(id);
            }
        }
        Ok(max)
    }

    fn suggest_tag_keys(
        &self,
        metric_id: MetricId,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<String>> {
        let mut keys = BTreeSet::new();
        for record in self.records(metric_id) {
            keys.extend(
                record?
                    .tag_keys
                    .into_iter()
                    .map(|t| t.tag_key)
                    .filter(|k| k.starts_with(prefix)),
            );
        }
        Ok(keys.into_iter().take(limit).collect())
    }
}

/// Writes metric meta records into a segment of the meta family
pub struct MetricsMetaFlusher {
    flusher: Box<dyn Flusher>,
}

impl MetricsMetaFlusher {
    /// Wrap a family flusher
    pub fn new(flusher: Box<dyn Flusher>) -> Self {
        Self { flusher }
    }

    /// Buffer the record of one metric
    pub fn flush_metric_meta(
        &mut self,
        metric_id: MetricId,
        tag_keys: &[TagKeyMeta],
        fields: &[FieldMeta],
    ) -> Result<()> {
        let value = encode_metric_meta(tag_keys, fields)?;
        self.flusher.add(metric_id, &value)
    }

    /// Commit the segment
    pub fn commit(&mut self) -> Result<()> {
        self.flusher.commit()
    }
}
