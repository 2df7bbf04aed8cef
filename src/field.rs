//! Declarations of bit fields packed by [crate::packer].

/// One bit field: `width` bits starting at bit `bit` of byte `byte`, holding `value`.
///
/// `value` is truncated to its low `width` bits when packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct FieldDeclaration {
    /// Byte offset of the field.
    pub byte: usize,
    /// Bit offset within `byte`, 0 being the most significant bit.
    #[cfg_attr(feature = "serde", serde(default))]
    pub bit: usize,
    /// Number of bits in the field.
    pub width: usize,
    /// Value to store. Negative values are stored in two's complement.
    pub value: i64,
}

impl FieldDeclaration {
    pub fn new(byte: usize, bit: usize, width: usize, value: i64) -> Self {
        FieldDeclaration {
            byte,
            bit,
            width,
            value,
        }
    }

    /// Absolute bit position of the first (most significant) bit of the field.
    pub fn start_bit(&self) -> usize {
        8 * self.byte + self.bit
    }

    /// Absolute bit position just past the last bit of the field.
    pub fn end_bit(&self) -> usize {
        self.start_bit() + self.width
    }
}
