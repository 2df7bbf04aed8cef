//! Bit-addressed byte buffer and read helpers.
//!
//! Bits are addressed in MSB-first order: bit 0 is the high bit of the first byte,
//! bit 7 is the low bit of the first byte, bit 8 is the high bit of the second byte.

use crate::errors::ReadError;

/// Growable byte buffer written one bit (or one run of bits) at a time.
///
/// The buffer is only ever as long as needed to hold the highest bit written so far.
/// Bits that were never written read back as 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitBuffer {
    bytes: Vec<u8>,
}

impl BitBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes the low bit of `value` at absolute bit position `bit_pos`.
    pub fn set_bit(&mut self, bit_pos: usize, value: u8) {
        let byte_index = bit_pos / 8;
        let bit_index = bit_pos % 8;

        if self.bytes.len() <= byte_index {
            self.bytes.resize(byte_index + 1, 0);
        }

        let mask = 1u8 << (7 - bit_index);
        if value & 1 == 0 {
            self.bytes[byte_index] &= !mask;
        } else {
            self.bytes[byte_index] |= mask;
        }
    }

    /// Writes the low `width` bits of `value` starting at `start`, most significant bit first.
    ///
    /// A `width` of 0 writes nothing. Widths above 64 pad the front of the run with zeros.
    pub fn set_bits(&mut self, start: usize, width: usize, value: u64) {
        let value = value & low_mask(width);

        for i in 0..width {
            let shift = width - i - 1;
            let bit = if shift >= 64 { 0 } else { (value >> shift) & 1 };
            self.set_bit(start + i, bit as u8);
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl From<BitBuffer> for Vec<u8> {
    fn from(buffer: BitBuffer) -> Self {
        buffer.bytes
    }
}

/// Mask covering the low `width` bits of a `u64`.
pub fn low_mask(width: usize) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Reads a single bit at `bit_pos` (0 = MSB of first byte). Returns 0 or 1.
pub fn read_bit_at(data: &[u8], bit_pos: usize) -> Result<u8, ReadError> {
    if bit_pos >= data.len() * 8 {
        return Err(ReadError::OutOfBounds);
    }

    let byte_index = bit_pos / 8;
    let bit_index = bit_pos % 8;

    Ok((data[byte_index] >> (7 - bit_index)) & 1)
}

/// Reads `n` bits starting at `bit_pos` as an unsigned value (max 64 bits). MSB-first.
pub fn read_bits_at(data: &[u8], bit_pos: usize, n: usize) -> Result<u64, ReadError> {
    if n > 64 {
        return Err(ReadError::TooManyBitsRead);
    }

    if bit_pos
        .checked_add(n)
        .is_none_or(|end| end > data.len() * 8)
    {
        return Err(ReadError::OutOfBounds);
    }

    let mut value = 0u64;
    for pos in bit_pos..bit_pos + n {
        value = (value << 1) | read_bit_at(data, pos)? as u64;
    }

    Ok(value)
}
