//! GPDMA / LPDMA register map (RM0456 §17.8).
//!
//! Every channel has the same register block at
//! `base + 0x50 + 0x80 * channel`; [`channel_register`] computes the
//! address instead of one match arm per channel.

use bitflags::bitflags;

use crate::regs::Field;

/// GPDMA1 base address (STM32U5).
pub const GPDMA1_BASE: usize = 0x4002_0000;
/// LPDMA1 base address (STM32U5).
pub const LPDMA1_BASE: usize = 0x4602_5000;
/// Channels on GPDMA1.
pub const GPDMA1_CHANNELS: u8 = 16;
/// Channels on LPDMA1.
pub const LPDMA1_CHANNELS: u8 = 4;

/// Offset of channel 0's block from the controller base.
pub const CHANNEL_OFFSET: usize = 0x50;
/// Distance between consecutive channel blocks.
pub const CHANNEL_STRIDE: usize = 0x80;

/// Linked-list base address register
pub const CLBAR: usize = 0x00;
/// Flag clear register
pub const CFCR: usize = 0x0C;
/// Status register
pub const CSR: usize = 0x10;
/// Control register
pub const CCR: usize = 0x14;
/// Transfer register 1
pub const CTR1: usize = 0x40;
/// Transfer register 2
pub const CTR2: usize = 0x44;
/// Block register 1
pub const CBR1: usize = 0x48;
/// Source address register
pub const CSAR: usize = 0x4C;
/// Destination address register
pub const CDAR: usize = 0x50;
/// Transfer register 3
pub const CTR3: usize = 0x54;
/// Linked-list address register
pub const CLLR: usize = 0x7C;

/// Address of register `offset` in `channel`'s block.
#[allow(clippy::cast_lossless)] // usize::from is not const
pub const fn channel_register(base: usize, channel: u8, offset: usize) -> usize {
    base.wrapping_add(CHANNEL_OFFSET)
        .wrapping_add(CHANNEL_STRIDE.wrapping_mul(channel as usize))
        .wrapping_add(offset)
}

// ── CSR ─────────────────────────────────────────────────────────────────────

/// CSR.IDLEF: channel idle (suspended, reset or never enabled)
pub const CSR_IDLEF: Field = Field::bit(0);
/// CSR.FIFOL: FIFO level in units of the source data width
pub const CSR_FIFOL: Field = Field::new(16, 8);

// ── CCR ─────────────────────────────────────────────────────────────────────

/// CCR.EN
pub const CCR_EN: Field = Field::bit(0);
/// CCR.RESET: hardware clears EN, SUSP and itself
pub const CCR_RESET: Field = Field::bit(1);
/// CCR.SUSP
pub const CCR_SUSP: Field = Field::bit(2);
/// CCR.PRIO
pub const CCR_PRIO: Field = Field::new(22, 2);

// ── CTR1 ────────────────────────────────────────────────────────────────────

/// CTR1.SDW_LOG2: source data width
pub const CTR1_SDW: Field = Field::new(0, 2);
/// CTR1.SINC: source incrementing burst
pub const CTR1_SINC: Field = Field::bit(3);
/// CTR1.SBL_1: source burst length minus one
pub const CTR1_SBL_1: Field = Field::new(4, 6);
/// CTR1.SBX: source byte exchange within half-words
pub const CTR1_SBX: Field = Field::bit(13);
/// CTR1.SAP: source allocated port
pub const CTR1_SAP: Field = Field::bit(14);
/// CTR1.SSEC: source security attribute
pub const CTR1_SSEC: Field = Field::bit(15);
/// CTR1.DDW_LOG2: destination data width
pub const CTR1_DDW: Field = Field::new(16, 2);
/// CTR1.DINC: destination incrementing burst
pub const CTR1_DINC: Field = Field::bit(19);
/// CTR1.DBL_1: destination burst length minus one
pub const CTR1_DBL_1: Field = Field::new(20, 6);
/// CTR1.DBX + CTR1.DHX as one two-bit swap selector
pub const CTR1_DEST_SWAP: Field = Field::new(26, 2);
/// CTR1.DAP: destination allocated port
pub const CTR1_DAP: Field = Field::bit(30);
/// CTR1.DSEC: destination security attribute
pub const CTR1_DSEC: Field = Field::bit(31);

// ── CTR2 ────────────────────────────────────────────────────────────────────

/// CTR2.REQSEL: hardware request selector (GPDMA1 has 126 requests)
pub const CTR2_REQSEL: Field = Field::new(0, 7);
/// CTR2.SWREQ: software request (memory-to-memory)
pub const CTR2_SWREQ: Field = Field::bit(9);
/// CTR2.DREQ: destination is the flow controller
pub const CTR2_DREQ: Field = Field::bit(10);
/// CTR2.BREQ: block-level request
pub const CTR2_BREQ: Field = Field::bit(11);
/// CTR2.TRIGSEL
pub const CTR2_TRIGSEL: Field = Field::new(16, 6);
/// CTR2.TCEM: transfer complete event mode
pub const CTR2_TCEM: Field = Field::new(30, 2);

// ── CBR1 / CTR3 ─────────────────────────────────────────────────────────────

/// CBR1.BNDT: bytes left in the current block
pub const CBR1_BNDT: Field = Field::new(0, 16);
/// CTR3.SAO: source address offset (stride)
pub const CTR3_SAO: Field = Field::new(0, 13);
/// CTR3.DAO: destination address offset (stride)
pub const CTR3_DAO: Field = Field::new(16, 13);

// ── CLLR ────────────────────────────────────────────────────────────────────

/// Address bits of CLBAR (upper half-word of the list pointer)
pub const CLBAR_MASK: u32 = 0xFFFF_0000;
/// Address bits of CLLR.LA (word-aligned lower half-word)
pub const CLLR_LA_MASK: u32 = 0x0000_FFFC;

bitflags! {
    /// CSR event flags; the same bit positions are the CCR interrupt
    /// enables and the CFCR clear bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ChannelFlags: u32 {
        /// TCF: transfer complete
        const TRANSFER_COMPLETE = 1 << 8;
        /// HTF: half transfer
        const HALF_TRANSFER = 1 << 9;
        /// DTEF: data transfer error
        const DATA_TRANSFER_ERROR = 1 << 10;
        /// ULEF: update link transfer error
        const UPDATE_LINK_ERROR = 1 << 11;
        /// USEF: user setting error
        const USER_SETTING_ERROR = 1 << 12;
        /// SUSPF: completed suspension
        const SUSPENDED = 1 << 13;
        /// TOF: trigger overrun
        const TRIGGER_OVERRUN = 1 << 14;

        /// Every flag that means the transfer went wrong
        const ERRORS = Self::DATA_TRANSFER_ERROR.bits()
            | Self::UPDATE_LINK_ERROR.bits()
            | Self::USER_SETTING_ERROR.bits();
    }
}

bitflags! {
    /// CLLR update bits: which registers the next linked-list item reloads.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LinkUpdate: u32 {
        /// ULL: CLLR
        const LINK = 1 << 16;
        /// UDA: CDAR
        const DESTINATION_ADDRESS = 1 << 27;
        /// USA: CSAR
        const SOURCE_ADDRESS = 1 << 28;
        /// UB1: CBR1
        const BLOCK = 1 << 29;
        /// UT2: CTR2
        const TRANSFER_2 = 1 << 30;
        /// UT1: CTR1
        const TRANSFER_1 = 1 << 31;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ChannelFlags {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "ChannelFlags({=u32:#x})", self.bits());
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for LinkUpdate {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "LinkUpdate({=u32:#x})", self.bits());
    }
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_register_layout() {
        assert_eq!(channel_register(GPDMA1_BASE, 0, CLBAR), 0x4002_0050);
        assert_eq!(channel_register(GPDMA1_BASE, 0, CCR), 0x4002_0064);
        assert_eq!(channel_register(GPDMA1_BASE, 1, CLBAR), 0x4002_00D0);
        assert_eq!(channel_register(GPDMA1_BASE, 15, CLLR), 0x4002_0050 + 15 * 0x80 + 0x7C);
        assert_eq!(channel_register(LPDMA1_BASE, 3, CSR), 0x4602_5000 + 0x50 + 3 * 0x80 + 0x10);
    }

    #[test]
    fn test_channel_blocks_do_not_overlap() {
        // last register of channel n sits below the first of channel n + 1
        for ch in 0..GPDMA1_CHANNELS - 1 {
            assert!(channel_register(0, ch, CLLR) < channel_register(0, ch + 1, CLBAR));
        }
    }

    #[test]
    fn test_link_masks_cover_pointer() {
        assert_eq!(CLBAR_MASK | CLLR_LA_MASK | 0b11, u32::MAX);
        assert_eq!(CLBAR_MASK & CLLR_LA_MASK, 0);
    }

    #[test]
    fn test_link_update_bits_avoid_address_field() {
        assert_eq!(LinkUpdate::all().bits() & CLLR_LA_MASK, 0);
    }
}
