//! Segment table file format
//!
//! One committed segment of a directory-backed family is one table file.
//!
//! # Format
//!
//! ```text
//! +------------------+
//! | Magic: "TSST"    | 4 bytes
//! | Format Version   | 1 byte
//! | Entry Count      | 4 bytes (u32 LE)
//! | Entries          | Entry Count times:
//! |   Key            |   4 bytes (u32 LE)
//! |   Value Length   |   4 bytes (u32 LE)
//! |   Value          |   variable
//! | CRC32            | 4 bytes (u32 LE, over everything above)
//! +------------------+
//! ```
//!
//! Entries are written in ascending key order.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Cursor, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::family::FamilyKey;

/// Table magic bytes: "TSST"
pub const TABLE_MAGIC: [u8; 4] = *b"TSST";

/// Current table format version
pub const TABLE_FORMAT_VERSION: u8 = 1;

/// Size of magic + version + entry count + crc
const TABLE_MIN_SIZE: usize = 4 + 1 + 4 + 4;

/// Serialize a segment's entries to table bytes
pub fn encode_table(entries: &BTreeMap<FamilyKey, Vec<u8>>) -> Result<Vec<u8>, TableError> {
    let payload: usize = entries.values().map(|v| 8 + v.len()).sum();
    let mut buf = Vec::with_capacity(TABLE_MIN_SIZE + payload);

    buf.extend_from_slice(&TABLE_MAGIC);
    buf.write_u8(TABLE_FORMAT_VERSION)?;
    let count = u32::try_from(entries.len()).map_err(|_| TableError::TooLarge)?;
    buf.write_u32::<LittleEndian>(count)?;

    for (key, value) in entries {
        let len = u32::try_from(value.len()).map_err(|_| TableError::TooLarge)?;
        buf.write_u32::<LittleEndian>(*key)?;
        buf.write_u32::<LittleEndian>(len)?;
        buf.extend_from_slice(value);
    }

    let crc = crc32fast::hash(&buf);
    buf.write_u32::<LittleEndian>(crc)?;
    Ok(buf)
}

/// Deserialize table bytes, verifying magic, version and checksum
pub fn decode_table(bytes: &[u8]) -> Result<BTreeMap<FamilyKey, Vec<u8>>, TableError> {
    if bytes.len() < TABLE_MIN_SIZE {
        return Err(TableError::TooShort);
    }
    if bytes[0..4] != TABLE_MAGIC {
        return Err(TableError::InvalidMagic);
    }

    let (data, crc_bytes) = bytes.split_at(bytes.len() - 4);
    let stored_crc = Cursor::new(crc_bytes).read_u32::<LittleEndian>()?;
    let computed_crc = crc32fast::hash(data);
    if stored_crc != computed_crc {
        return Err(TableError::ChecksumMismatch {
            expected: stored_crc,
            computed: computed_crc,
        });
    }

    let mut cursor = Cursor::new(&data[4..]);
    let version = cursor.read_u8()?;
    if version != TABLE_FORMAT_VERSION {
        return Err(TableError::UnsupportedVersion(version));
    }

    let count = cursor.read_u32::<LittleEndian>()?;
    let mut entries = BTreeMap::new();
    for _ in 0..count {
        let key = cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| TableError::TooShort)?;
        let len = cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| TableError::TooShort)? as usize;
        let remaining = data.len() - 4 - cursor.position() as usize;
        if len > remaining {
            return Err(TableError::TooShort);
        }
        let mut value = vec![0u8; len];
        cursor.read_exact(&mut value)?;
        entries.insert(key, value);
    }

    if cursor.position() as usize != data.len() - 4 {
        return Err(TableError::TrailingBytes);
    }
    Ok(entries)
}

/// Write a table file atomically (write-fsync-rename)
///
/// The file only appears under `path` once its contents are synced.
pub fn write_table_file(
    path: &Path,
    tmp_path: &Path,
    entries: &BTreeMap<FamilyKey, Vec<u8>>,
) -> Result<(), TableError> {
    let bytes = encode_table(entries)?;

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(tmp_path)?;
    file.write_all(&bytes)?;
    file.sync_all()?;
    drop(file);

    std::fs::rename(tmp_path, path)?;

    if let Some(parent) = path.parent() {
        if parent.exists() {
            let dir = File::open(parent)?;
            dir.sync_all()?;
        }
    }
    Ok(())
}

/// Read and verify a table file
pub fn read_table_file(path: &Path) -> Result<BTreeMap<FamilyKey, Vec<u8>>, TableError> {
    let bytes = std::fs::read(path)?;
    decode_table(&bytes)
}

/// Errors that can occur with table files
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// Table shorter than its header or than an entry it declares
    #[error("table too short")]
    TooShort,

    /// Invalid magic bytes
    #[error("invalid table magic")]
    InvalidMagic,

    /// Format version this build cannot read
    #[error("unsupported table format version {0}")]
    UnsupportedVersion(u8),

    /// Checksum mismatch
    #[error("table checksum mismatch: expected {expected:08x}, computed {computed:08x}")]
    ChecksumMismatch {
        /// Expected CRC32 value (from file)
        expected: u32,
        /// Computed CRC32 value
        computed: u32,
    },

    /// Bytes left over after the declared entries
    #[error("trailing bytes after table entries")]
    TrailingBytes,

    /// Entry count or value length does not fit in u32
    #[error("table too large")]
    TooLarge,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<TableError> for tsid_core::Error {
    fn from(e: TableError) -> Self {
        match e {
            TableError::Io(io) => tsid_core::Error::IoError(io),
            TableError::TooLarge => tsid_core::Error::storage("table too large"),
            other => tsid_core::Error::corruption(other.to_string()),
        }
    }
}
