//! Declarative register fields.

/// A contiguous bit field inside a 32-bit register.
///
/// Fields are `const` values in the per-peripheral register tables, so one
/// generic `pack`/`unpack` pair replaces a shift/mask macro per field.
/// Values wider than the field are truncated by the mask, the same way the
/// hardware ignores them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Field {
    offset: u8,
    width: u8,
}

#[allow(clippy::cast_lossless)] // u32::from is not const
impl Field {
    /// Create a field starting at bit `offset`, `width` bits wide.
    pub const fn new(offset: u8, width: u8) -> Self {
        Self { offset, width }
    }

    /// A single-bit field.
    pub const fn bit(offset: u8) -> Self {
        Self::new(offset, 1)
    }

    /// Lowest bit position.
    pub const fn offset(self) -> u8 {
        self.offset
    }

    /// Number of bits.
    pub const fn width(self) -> u8 {
        self.width
    }

    /// In-place mask of the field (already shifted).
    pub const fn mask(self) -> u32 {
        let ones = match u32::MAX.checked_shr(32u32.saturating_sub(self.width as u32)) {
            Some(v) if self.width > 0 => v,
            _ => 0,
        };
        ones.wrapping_shl(self.offset as u32)
    }

    /// Shift `value` into position, truncated to the field width.
    pub const fn pack(self, value: u32) -> u32 {
        value.wrapping_shl(self.offset as u32) & self.mask()
    }

    /// Extract the field from a register image.
    pub const fn unpack(self, word: u32) -> u32 {
        (word & self.mask()).wrapping_shr(self.offset as u32)
    }

    /// Return `word` with the field replaced by `value`.
    pub const fn replace(self, word: u32, value: u32) -> u32 {
        (word & !self.mask()) | self.pack(value)
    }
}
