//! Unsigned LEB128 varints
//!
//! Only the two operations the record formats need: append one value, read
//! one value from a cursor.

use std::io::Cursor;

use tsid_core::{Error, Result};

/// Longest encoding of a u64
const MAX_VARINT_LEN: usize = 10;

/// Append `value` to `buf` as an unsigned varint
pub fn put_uvarint(buf: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

/// Read one unsigned varint, advancing the cursor past it
///
/// # Errors
///
/// Returns `Corruption` on truncated input or an encoding longer than a u64.
pub fn read_uvarint(cursor: &mut Cursor<&[u8]>) -> Result<u64> {
    let buf = *cursor.get_ref();
    let mut pos = cursor.position() as usize;
    let mut value: u64 = 0;
    let mut shift = 0u32;

    for i in 0..MAX_VARINT_LEN {
        let b = *buf
            .get(pos)
            .ok_or_else(|| Error::corruption("truncated varint"))?;
        pos += 1;
        if i == MAX_VARINT_LEN - 1 && b > 1 {
            return Err(Error::corruption("varint overflows u64"));
        }
        value |= u64::from(b & 0x7f) << shift;
        if b < 0x80 {
            cursor.set_position(pos as u64);
            return Ok(value);
        }
        shift += 7;
    }
    Err(Error::corruption("varint overflows u64"))
}
