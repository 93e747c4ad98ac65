//! Register file abstraction
//!
//! All peripheral access in this crate goes through [`RegisterFile`]. On
//! target it is bound to [`Mmio`] (volatile loads and stores); in tests and
//! on the host it is bound to [`SimRegisters`], an address → value map that
//! records every access in order.

mod field;
mod mmio;
mod sim;

pub use field::Field;
pub use mmio::Mmio;
pub use sim::{
    Access, AccessKind, AccessWidth, SimFull, SimRegisters, SIM_READ_QUEUE, SIM_REGISTERS,
    SIM_TRACE,
};

/// Byte-addressed access to 8/16/32-bit peripheral registers.
///
/// Reads take `&mut self` because hardware reads have side effects
/// (popping a FIFO, clearing a flag) and the simulated file records them.
pub trait RegisterFile {
    /// Read a 32-bit register.
    fn read32(&mut self, addr: usize) -> u32;

    /// Write a 32-bit register.
    fn write32(&mut self, addr: usize, value: u32);

    /// Read a 16-bit register (or the low half-word lane of a data register).
    fn read16(&mut self, addr: usize) -> u16;

    /// Write a 16-bit register.
    fn write16(&mut self, addr: usize, value: u16);

    /// Read an 8-bit register (or the low byte lane of a data register).
    fn read8(&mut self, addr: usize) -> u8;

    /// Write an 8-bit register.
    fn write8(&mut self, addr: usize, value: u8);

    /// Read-modify-write a 32-bit register.
    fn modify32<F>(&mut self, addr: usize, f: F)
    where
        F: FnOnce(u32) -> u32,
    {
        let value = self.read32(addr);
        self.write32(addr, f(value));
    }

    /// Set `mask` bits in a 32-bit register.
    fn set_bits32(&mut self, addr: usize, mask: u32) {
        self.modify32(addr, |v| v | mask);
    }

    /// Clear `mask` bits in a 32-bit register.
    fn clear_bits32(&mut self, addr: usize, mask: u32) {
        self.modify32(addr, |v| v & !mask);
    }

    /// Replace one field of a 32-bit register.
    fn write_field(&mut self, addr: usize, field: Field, value: u32) {
        self.modify32(addr, |v| field.replace(v, value));
    }

    /// Read one field of a 32-bit register.
    fn read_field(&mut self, addr: usize, field: Field) -> u32 {
        field.unpack(self.read32(addr))
    }
}

impl<R: RegisterFile + ?Sized> RegisterFile for &mut R {
    fn read32(&mut self, addr: usize) -> u32 {
        (**self).read32(addr)
    }

    fn write32(&mut self, addr: usize, value: u32) {
        (**self).write32(addr, value);
    }

    fn read16(&mut self, addr: usize) -> u16 {
        (**self).read16(addr)
    }

    fn write16(&mut self, addr: usize, value: u16) {
        (**self).write16(addr, value);
    }

    fn read8(&mut self, addr: usize) -> u8 {
        (**self).read8(addr)
    }

    fn write8(&mut self, addr: usize, value: u8) {
        (**self).write8(addr, value);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_modify_keeps_untouched_bits() {
        let mut regs = SimRegisters::new();
        regs.set(0x100, 0xF0F0_0000);
        regs.modify32(0x100, |v| v | 0x1);
        assert_eq!(regs.get(0x100), 0xF0F0_0001);
    }

    #[test]
    fn test_set_and_clear_bits() {
        let mut regs = SimRegisters::new();
        regs.set_bits32(0x10, 0b1010);
        regs.clear_bits32(0x10, 0b0010);
        assert_eq!(regs.get(0x10), 0b1000);
    }

    #[test]
    fn test_write_field_only_touches_field() {
        let mut regs = SimRegisters::new();
        regs.set(0x20, 0xFFFF_FFFF);
        regs.write_field(0x20, Field::new(8, 4), 0x3);
        assert_eq!(regs.get(0x20), 0xFFFF_F3FF);
        assert_eq!(regs.read_field(0x20, Field::new(8, 4)), 0x3);
    }

    #[test]
    fn test_borrowed_register_file_forwards() {
        let mut regs = SimRegisters::new();
        {
            let mut borrowed = &mut regs;
            borrowed.write32(0x40, 7);
        }
        assert_eq!(regs.get(0x40), 7);
        assert_eq!(regs.trace().len(), 1);
    }
}
