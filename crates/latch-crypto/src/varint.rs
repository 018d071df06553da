//! Unsigned LEB128 codec for `u32`.
//!
//! Wire format: 7 data bits per byte, least-significant group first. The high
//! bit is set on every byte except the last one. A `u32` takes 1 to 5 bytes.

use crate::error::VarintError;

/// Maximum encoded length of a `u32`.
pub const MAX_VARINT_LEN: usize = 5;

const CONTINUATION_BIT: u8 = 0x80;
const DATA_MASK: u8 = 0x7f;

/// A decoded value and the index of the first byte after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    pub value: u32,
    pub next_index: usize,
}

/// Encode a `u32`.
pub fn encode(value: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_len(value));
    encode_into(value, &mut out);
    out
}

/// Append the encoding of `value` to `out`.
pub fn encode_into(value: u32, out: &mut Vec<u8>) {
    let mut remaining = value;
    while remaining >= u32::from(CONTINUATION_BIT) {
        out.push((remaining as u8 & DATA_MASK) | CONTINUATION_BIT);
        remaining >>= 7;
    }
    out.push(remaining as u8);
}

/// Number of bytes `encode(value)` produces.
pub fn encoded_len(value: u32) -> usize {
    match value {
        0..=0x7f => 1,
        0x80..=0x3fff => 2,
        0x4000..=0x1f_ffff => 3,
        0x20_0000..=0x0fff_ffff => 4,
        _ => 5,
    }
}

/// Encode an untyped number, as found in JSON input.
///
/// Rejects NaN and infinities, negative values, fractions and anything above
/// `u32::MAX`, each with its own error.
pub fn encode_number(value: f64) -> Result<Vec<u8>, VarintError> {
    if !value.is_finite() {
        return Err(VarintError::NotFinite);
    }
    if value < 0.0 {
        return Err(VarintError::Negative);
    }
    if value.fract() != 0.0 {
        return Err(VarintError::NotInteger);
    }
    if value > f64::from(u32::MAX) {
        return Err(VarintError::OutOfRange);
    }
    Ok(encode(value as u32))
}

/// Decode one value starting at `offset`.
pub fn decode(bytes: &[u8], offset: usize) -> Result<Decoded, VarintError> {
    if offset >= bytes.len() {
        return Err(VarintError::OffsetOutOfBounds {
            offset,
            len: bytes.len(),
        });
    }

    let mut result: u32 = 0;
    for i in 0..MAX_VARINT_LEN {
        let Some(&byte) = bytes.get(offset + i) else {
            return Err(VarintError::Truncated);
        };
        // Bits shifted past 32 are dropped, same as u32 wrapping.
        result |= u32::from(byte & DATA_MASK) << (7 * i);
        if byte & CONTINUATION_BIT == 0 {
            return Ok(Decoded {
                value: result,
                next_index: offset + i + 1,
            });
        }
    }

    Err(VarintError::Overflow)
}
