//! Tagged variable-length signed integers.
//!
//! Wire form: a single `0x00` byte for zero, otherwise a non-zero tag byte
//! followed by a big-endian `i64` high word and a big-endian `u64` low word.
//! The value is `(high << 64) + low`, which covers exactly the `i128` range.

use super::{CodecError, Reader};
use crate::wei::Wei;

pub const ZERO_TAG: u8 = 0;
pub const WIDE_TAG: u8 = 1;
pub const WIDE_LEN: usize = 17;

pub fn read_packed(reader: &mut Reader<'_>) -> Result<Wei, CodecError> {
    if reader.u8()? == ZERO_TAG {
        return Ok(0);
    }
    let high = reader.i64()?;
    let low = reader.u64()?;
    Ok(((high as i128) << 64) | low as i128)
}

pub fn write_packed(out: &mut Vec<u8>, value: Wei) {
    if value == 0 {
        out.push(ZERO_TAG);
        return;
    }
    out.push(WIDE_TAG);
    out.extend_from_slice(&((value >> 64) as i64).to_be_bytes());
    out.extend_from_slice(&(value as u64).to_be_bytes());
}

/// Number of bytes `value` occupies on the wire.
pub fn packed_len(value: Wei) -> usize {
    if value == 0 {
        1
    } else {
        WIDE_LEN
    }
}
