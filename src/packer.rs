//! Packing field declarations into byte buffers.

use tracing::trace;

use crate::{bits::BitBuffer, errors::PackError, field::FieldDeclaration};

/// Packs `fields` in order into a new buffer.
///
/// Overlapping fields are not rejected: a later field overwrites the bits of an earlier one.
pub fn pack(fields: &[FieldDeclaration]) -> Vec<u8> {
    let mut buffer = BitBuffer::new();

    for field in fields {
        trace!(
            byte = field.byte,
            bit = field.bit,
            width = field.width,
            value = field.value,
            "packing field"
        );
        buffer.set_bits(field.start_bit(), field.width, field.value as u64);
    }

    buffer.into_bytes()
}

/// Packer that validates declarations before packing them.
///
/// By default only widths are checked. Use [Packer::set_reject_overlaps] to also reject
/// fields that write a bit an earlier field already wrote.
#[derive(Debug, Clone)]
pub struct Packer {
    /// Reject declarations whose bit ranges overlap.
    pub reject_overlaps: bool,
    /// Widest field accepted, in bits.
    pub max_width: usize,
}

impl Default for Packer {
    fn default() -> Self {
        Self {
            reject_overlaps: false,
            max_width: 64,
        }
    }
}

impl Packer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_reject_overlaps(&mut self, reject_overlaps: bool) -> &mut Self {
        self.reject_overlaps = reject_overlaps;
        self
    }

    pub fn set_max_width(&mut self, max_width: usize) -> &mut Self {
        self.max_width = max_width;
        self
    }

    /// Checks `fields` against this packer's rules without packing them.
    pub fn validate(&self, fields: &[FieldDeclaration]) -> Result<(), PackError> {
        for (index, field) in fields.iter().enumerate() {
            if field.width == 0 {
                return Err(PackError::ZeroWidth { index });
            }
            if field.width > self.max_width {
                return Err(PackError::WidthTooLarge {
                    index,
                    width: field.width,
                    max: self.max_width,
                });
            }

            if self.reject_overlaps {
                for (earlier, other) in fields[..index].iter().enumerate() {
                    let start = field.start_bit().max(other.start_bit());
                    if start < field.end_bit().min(other.end_bit()) {
                        return Err(PackError::Overlap {
                            index,
                            earlier,
                            bit: start,
                        });
                    }
                }
            }
        }

        Ok(())
    }

    /// Validates and then packs `fields`.
    pub fn pack(&self, fields: &[FieldDeclaration]) -> Result<Vec<u8>, PackError> {
        self.validate(fields)?;
        Ok(pack(fields))
    }
}
