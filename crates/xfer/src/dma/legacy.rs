//! Channel-based DMA controller (STM32 F0/F1/F3/L0/L1, RM0008 §13).
//!
//! Seven channels, each a CCR/CNDTR/CPAR/CMAR quartet, sharing one
//! ISR/IFCR pair with four flag bits per channel. Channels are numbered
//! from 1 as in the reference manual (DMA1 has 1–7, DMA2 has 1–5); every
//! operation validates the number and touches only that channel's
//! registers.

use bitflags::bitflags;

use super::descriptor::{DataWidth, Priority};
use crate::error::XferError;
use crate::regs::{Field, RegisterFile};

/// DMA1 base address.
pub const DMA1_BASE: usize = 0x4002_0000;
/// DMA2 base address.
pub const DMA2_BASE: usize = 0x4002_0400;
/// Channels on DMA1, and the most any controller of this kind has.
pub const LEGACY_CHANNELS: u8 = 7;
/// Channels on DMA2. The register slots for 6 and 7 are reserved.
pub const DMA2_CHANNELS: u8 = 5;

/// Interrupt status register
pub const ISR: usize = 0x00;
/// Interrupt flag clear register
pub const IFCR: usize = 0x04;
/// Channel 1 configuration register
pub const CCR1: usize = 0x08;
/// Channel 1 number of data register
pub const CNDTR1: usize = 0x0C;
/// Channel 1 peripheral address register
pub const CPAR1: usize = 0x10;
/// Channel 1 memory address register
pub const CMAR1: usize = 0x14;
/// Distance between channel register sets
pub const LEGACY_STRIDE: usize = 0x14;

const CCR_EN: Field = Field::bit(0);
const CCR_TCIE: Field = Field::bit(1);
const CCR_HTIE: Field = Field::bit(2);
const CCR_TEIE: Field = Field::bit(3);
const CCR_DIR: Field = Field::bit(4);
const CCR_CIRC: Field = Field::bit(5);
const CCR_PINC: Field = Field::bit(6);
const CCR_MINC: Field = Field::bit(7);
const CCR_PSIZE: Field = Field::new(8, 2);
const CCR_MSIZE: Field = Field::new(10, 2);
const CCR_PL: Field = Field::new(12, 2);
const CCR_MEM2MEM: Field = Field::bit(14);

const CNDTR_NDT: Field = Field::new(0, 16);

bitflags! {
    /// Per-channel ISR/IFCR bits, at channel 1's position. The driver
    /// shifts them by `4 * (n - 1)` for channel `n`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LegacyFlags: u32 {
        /// GIF: any of the three below
        const GLOBAL = 1 << 0;
        /// TCIF: transfer complete
        const TRANSFER_COMPLETE = 1 << 1;
        /// HTIF: half transfer
        const HALF_TRANSFER = 1 << 2;
        /// TEIF: transfer error
        const TRANSFER_ERROR = 1 << 3;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for LegacyFlags {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "LegacyFlags({=u32:#x})", self.bits());
    }
}

/// Channel-based DMA controller bound to a register file.
pub struct LegacyDma<R> {
    regs: R,
    base: usize,
    channels: u8,
}

impl<R: RegisterFile> LegacyDma<R> {
    /// Bind a controller at `base` with channels `1..=channels`.
    ///
    /// `channels` is capped at [`LEGACY_CHANNELS`].
    pub fn new(regs: R, base: usize, channels: u8) -> Self {
        Self {
            regs,
            base,
            channels: channels.min(LEGACY_CHANNELS),
        }
    }

    /// DMA1, channels 1–7.
    pub fn dma1(regs: R) -> Self {
        Self::new(regs, DMA1_BASE, LEGACY_CHANNELS)
    }

    /// DMA2, channels 1–5.
    pub fn dma2(regs: R) -> Self {
        Self::new(regs, DMA2_BASE, DMA2_CHANNELS)
    }

    /// Highest valid channel number.
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Controller base address.
    pub fn base(&self) -> usize {
        self.base
    }

    /// Borrow the register file.
    pub fn regs(&self) -> &R {
        &self.regs
    }

    /// Give the register file back.
    pub fn release(self) -> R {
        self.regs
    }

    fn index(&self, channel: u8) -> Result<usize, XferError> {
        if channel == 0 || channel > self.channels {
            return Err(XferError::InvalidChannel(channel));
        }
        Ok(usize::from(channel.saturating_sub(1)))
    }

    fn reg(&self, channel: u8, first: usize) -> Result<usize, XferError> {
        let n = self.index(channel)?;
        Ok(self
            .base
            .wrapping_add(first)
            .wrapping_add(LEGACY_STRIDE.wrapping_mul(n)))
    }

    fn flag_shift(&self, channel: u8) -> Result<u32, XferError> {
        self.index(channel)?;
        Ok(4u32.wrapping_mul(u32::from(channel.saturating_sub(1))))
    }

    fn ccr_field(&mut self, channel: u8, field: Field, value: u32) -> Result<(), XferError> {
        let ccr = self.reg(channel, CCR1)?;
        self.regs.write_field(ccr, field, value);
        Ok(())
    }

    /// Zero the channel's registers and clear its four flags.
    pub fn channel_reset(&mut self, channel: u8) -> Result<(), XferError> {
        let shift = self.flag_shift(channel)?;
        debug!("dma ch{}: reset", channel);
        for first in [CCR1, CNDTR1, CPAR1, CMAR1] {
            let addr = self.reg(channel, first)?;
            self.regs.write32(addr, 0);
        }
        let ifcr = self.base.wrapping_add(IFCR);
        self.regs.write32(ifcr, LegacyFlags::all().bits().wrapping_shl(shift));
        Ok(())
    }

    /// Clear `flags` for one channel.
    pub fn clear_interrupt_flags(
        &mut self,
        channel: u8,
        flags: LegacyFlags,
    ) -> Result<(), XferError> {
        let shift = self.flag_shift(channel)?;
        let ifcr = self.base.wrapping_add(IFCR);
        self.regs.write32(ifcr, flags.bits().wrapping_shl(shift));
        Ok(())
    }

    /// Whether any of `flags` is set for one channel.
    pub fn interrupt_flag(&mut self, channel: u8, flags: LegacyFlags) -> Result<bool, XferError> {
        let shift = self.flag_shift(channel)?;
        let isr = self.base.wrapping_add(ISR);
        let bits = self.regs.read32(isr).wrapping_shr(shift);
        Ok(LegacyFlags::from_bits_truncate(bits).intersects(flags))
    }

    /// Memory-to-memory mode; circular mode is turned off.
    pub fn enable_mem2mem_mode(&mut self, channel: u8) -> Result<(), XferError> {
        let ccr = self.reg(channel, CCR1)?;
        self.regs
            .modify32(ccr, |v| (v | CCR_MEM2MEM.mask()) & !CCR_CIRC.mask());
        Ok(())
    }

    /// Circular mode; memory-to-memory mode is turned off.
    pub fn enable_circular_mode(&mut self, channel: u8) -> Result<(), XferError> {
        let ccr = self.reg(channel, CCR1)?;
        self.regs
            .modify32(ccr, |v| (v | CCR_CIRC.mask()) & !CCR_MEM2MEM.mask());
        Ok(())
    }

    /// Set the channel priority level.
    pub fn set_priority(&mut self, channel: u8, priority: Priority) -> Result<(), XferError> {
        self.ccr_field(channel, CCR_PL, priority.bits())
    }

    /// Set the memory-side word size.
    pub fn set_memory_size(&mut self, channel: u8, width: DataWidth) -> Result<(), XferError> {
        self.ccr_field(channel, CCR_MSIZE, width.bits())
    }

    /// Set the peripheral-side word size.
    pub fn set_peripheral_size(&mut self, channel: u8, width: DataWidth) -> Result<(), XferError> {
        self.ccr_field(channel, CCR_PSIZE, width.bits())
    }

    /// Turn memory address increment on or off.
    pub fn set_memory_increment(&mut self, channel: u8, on: bool) -> Result<(), XferError> {
        self.ccr_field(channel, CCR_MINC, u32::from(on))
    }

    /// Turn peripheral address increment on or off.
    pub fn set_peripheral_increment(&mut self, channel: u8, on: bool) -> Result<(), XferError> {
        self.ccr_field(channel, CCR_PINC, u32::from(on))
    }

    /// Peripheral → memory (DIR = 0).
    pub fn set_read_from_peripheral(&mut self, channel: u8) -> Result<(), XferError> {
        self.ccr_field(channel, CCR_DIR, 0)
    }

    /// Memory → peripheral (DIR = 1).
    pub fn set_read_from_memory(&mut self, channel: u8) -> Result<(), XferError> {
        self.ccr_field(channel, CCR_DIR, 1)
    }

    /// Transfer-error interrupt.
    pub fn set_transfer_error_interrupt(&mut self, channel: u8, on: bool) -> Result<(), XferError> {
        self.ccr_field(channel, CCR_TEIE, u32::from(on))
    }

    /// Half-transfer interrupt.
    pub fn set_half_transfer_interrupt(&mut self, channel: u8, on: bool) -> Result<(), XferError> {
        self.ccr_field(channel, CCR_HTIE, u32::from(on))
    }

    /// Transfer-complete interrupt.
    pub fn set_transfer_complete_interrupt(
        &mut self,
        channel: u8,
        on: bool,
    ) -> Result<(), XferError> {
        self.ccr_field(channel, CCR_TCIE, u32::from(on))
    }

    /// Items left to transfer.
    #[allow(clippy::cast_possible_truncation)] // Safety: NDT is 16 bits
    pub fn number_of_data(&mut self, channel: u8) -> Result<u16, XferError> {
        let addr = self.reg(channel, CNDTR1)?;
        Ok(CNDTR_NDT.unpack(self.regs.read32(addr)) as u16)
    }

    /// Items to transfer; only writable while the channel is disabled.
    pub fn set_number_of_data(&mut self, channel: u8, count: u16) -> Result<(), XferError> {
        let addr = self.reg(channel, CNDTR1)?;
        self.regs.write32(addr, u32::from(count));
        Ok(())
    }

    /// Peripheral data register address.
    pub fn set_peripheral_address(&mut self, channel: u8, address: u32) -> Result<(), XferError> {
        let addr = self.reg(channel, CPAR1)?;
        self.regs.write32(addr, address);
        Ok(())
    }

    /// Memory buffer address.
    pub fn set_memory_address(&mut self, channel: u8, address: u32) -> Result<(), XferError> {
        let addr = self.reg(channel, CMAR1)?;
        self.regs.write32(addr, address);
        Ok(())
    }

    /// Start the channel.
    pub fn enable_channel(&mut self, channel: u8) -> Result<(), XferError> {
        debug!("dma ch{}: enable", channel);
        self.ccr_field(channel, CCR_EN, 1)
    }

    /// Stop the channel.
    pub fn disable_channel(&mut self, channel: u8) -> Result<(), XferError> {
        debug!("dma ch{}: disable", channel);
        self.ccr_field(channel, CCR_EN, 0)
    }
}
