//! Metric name-ID record format
//!
//! Every flush of the name-ID family writes one record under
//! [`METRIC_NAME_IDS_KEY`]. A record carries the names flushed by that
//! flush plus both sequence values as of the flush.
//!
//! # Format
//!
//! ```text
//! +-------------------------------------------+
//! | zstd compressed body (absent when empty)  |
//! |   Name Length   | uvarint                 |
//! |   Name          | N bytes (UTF-8)         |
//! |   Metric ID     | 4 bytes (u32 LE)        |
//! |   ... repeated per name                   |
//! +-------------------------------------------+
//! | Metric ID Sequence  | 4 bytes (u32 LE)    |
//! | Tag Key ID Sequence | 4 bytes (u32 LE)    |
//! +-------------------------------------------+
//! ```
//!
//! The 8-byte trailer is fixed; a value shorter than it cannot be a
//! name-ID record.

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use tsid_core::{Error, MetricId, Result, TagKeyId};

use super::varint::{put_uvarint, read_uvarint};
use crate::family::{FamilyKey, Flusher};

/// Key of the name-ID record in the name-ID family
pub const METRIC_NAME_IDS_KEY: FamilyKey = 0;

/// Length of the sequence trailer
pub const SEQUENCE_TRAILER_LEN: usize = 8;

/// zstd level for record bodies
const COMPRESSION_LEVEL: i32 = 3;

/// The two catalog-wide sequence values
///
/// Each holds the last value handed out; the next allocation is `value + 1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sequences {
    /// Last allocated metric ID
    pub metric_id: MetricId,
    /// Last allocated tag-key ID
    pub tag_key_id: TagKeyId,
}

impl Sequences {
    /// Create sequence values
    pub fn new(metric_id: MetricId, tag_key_id: TagKeyId) -> Self {
        Self {
            metric_id,
            tag_key_id,
        }
    }

    /// Component-wise maximum
    pub fn max(self, other: Sequences) -> Sequences {
        Sequences {
            metric_id: self.metric_id.max(other.metric_id),
            tag_key_id: self.tag_key_id.max(other.tag_key_id),
        }
    }
}

/// Decoded content of one name-ID record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameIdRecord {
    /// Metric names and their IDs, in record order
    pub name_ids: Vec<(String, MetricId)>,
    /// Sequence values as of the flush that wrote the record
    pub sequences: Sequences,
}

/// Serialize a name-ID record
///
/// # Errors
///
/// Returns a storage error if compression fails.
pub fn encode_name_ids(name_ids: &[(String, MetricId)], sequences: Sequences) -> Result<Vec<u8>> {
    let mut value = if name_ids.is_empty() {
        Vec::with_capacity(SEQUENCE_TRAILER_LEN)
    } else {
        let mut body = Vec::new();
        for (name, metric_id) in name_ids {
            put_uvarint(&mut body, name.len() as u64);
            body.extend_from_slice(name.as_bytes());
            body.write_u32::<LittleEndian>(*metric_id)?;
        }
        zstd::encode_all(body.as_slice(), COMPRESSION_LEVEL)
            .map_err(|e| Error::storage(format!("compress name ids: {}", e)))?
    };

    value.write_u32::<LittleEndian>(sequences.metric_id)?;
    value.write_u32::<LittleEndian>(sequences.tag_key_id)?;
    Ok(value)
}

/// Deserialize a name-ID record
///
/// # Errors
///
/// Returns `Corruption` if the trailer is missing or the body does not
/// decompress or decode.
pub fn decode_name_ids(value: &[u8]) -> Result<NameIdRecord> {
    if value.len() < SEQUENCE_TRAILER_LEN {
        return Err(Error::corruption(format!(
            "name-id record of {} bytes has no {}-byte sequence trailer",
            value.len(),
            SEQUENCE_TRAILER_LEN
        )));
    }
    let (body, trailer) = value.split_at(value.len() - SEQUENCE_TRAILER_LEN);

    let mut trailer = Cursor::new(trailer);
    let sequences = Sequences {
        metric_id: trailer.read_u32::<LittleEndian>()?,
        tag_key_id: trailer.read_u32::<LittleEndian>()?,
    };

    let mut name_ids = Vec::new();
    if !body.is_empty() {
        let body = zstd::decode_all(body)
            .map_err(|e| Error::corruption(format!("decompress name ids: {}", e)))?;
        let mut cursor = Cursor::new(body.as_slice());
        while (cursor.position() as usize) < body.len() {
            let len = read_uvarint(&mut cursor)? as usize;
            let remaining = body.len() - cursor.position() as usize;
            if len > remaining {
                return Err(Error::corruption("metric name runs past end of record"));
            }
            let mut name = vec![0u8; len];
            cursor.read_exact(&mut name)?;
            let name = String::from_utf8(name)
                .map_err(|_| Error::corruption("metric name is not valid UTF-8"))?;
            let metric_id = cursor
                .read_u32::<LittleEndian>()
                .map_err(|_| Error::corruption("truncated metric id"))?;
            name_ids.push((name, metric_id));
        }
    }

    Ok(NameIdRecord {
        name_ids,
        sequences,
    })
}

/// Writes name-ID records into a segment of the name-ID family
pub struct NameIdFlusher {
    flusher: Box<dyn Flusher>,
}

impl NameIdFlusher {
    /// Wrap a family flusher
    pub fn new(flusher: Box<dyn Flusher>) -> Self {
        Self { flusher }
    }

    /// Buffer the record for `name_ids` and `sequences`
    pub fn flush_name_ids(
        &mut self,
        name_ids: &[(String, MetricId)],
        sequences: Sequences,
    ) -> Result<()> {
        let value = encode_name_ids(name_ids, sequences)?;
        self.flusher.add(METRIC_NAME_IDS_KEY, &value)
    }

    /// Commit the segment
    pub fn commit(&mut self) -> Result<()> {
        self.flusher.commit()
    }
}
