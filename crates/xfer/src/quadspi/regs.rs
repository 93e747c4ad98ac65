//! QUADSPI register map (RM0433 §24.5, RM0410 §14.5).
//!
//! Offsets are relative to the peripheral base; fields are [`Field`]
//! entries so the engine and the encoder share one table.

use bitflags::bitflags;

use crate::regs::Field;

/// Control register
pub const CR: usize = 0x00;
/// Device configuration register
pub const DCR: usize = 0x04;
/// Status register
pub const SR: usize = 0x08;
/// Flag clear register
pub const FCR: usize = 0x0C;
/// Data length register (programmed with length − 1)
pub const DLR: usize = 0x10;
/// Communication configuration register
pub const CCR: usize = 0x14;
/// Address register
pub const AR: usize = 0x18;
/// Alternate bytes register
pub const ABR: usize = 0x1C;
/// Data register (byte, half-word and word access)
pub const DR: usize = 0x20;
/// Polling status mask register
pub const PSMKR: usize = 0x24;
/// Polling status match register
pub const PSMAR: usize = 0x28;
/// Polling interval register
pub const PIR: usize = 0x2C;
/// Low-power timeout register
pub const LPTR: usize = 0x30;

// ── CR ──────────────────────────────────────────────────────────────────────

/// CR.PRESCALER: kernel clock divided by PRESCALER + 1
pub const CR_PRESCALER: Field = Field::new(24, 8);
/// CR.PMM: polling match mode (0 = AND, 1 = OR)
pub const CR_PMM: Field = Field::bit(23);
/// CR.APMS: stop automatic polling on match
pub const CR_APMS: Field = Field::bit(22);
/// CR.FTHRES: FIFO threshold level minus one
pub const CR_FTHRES: Field = Field::new(8, 5);
/// CR.DFM + CR.FSEL, treated as one two-bit flash selector
pub const CR_FLASH_SELECT: Field = Field::new(6, 2);
/// CR.SSHIFT: sample shift by half a cycle
pub const CR_SSHIFT: Field = Field::bit(4);
/// CR.TCEN: timeout counter enable
pub const CR_TCEN: Field = Field::bit(3);
/// CR.ABORT: abort request, cleared by hardware
pub const CR_ABORT: Field = Field::bit(1);
/// CR.EN: peripheral enable
pub const CR_EN: Field = Field::bit(0);

// ── DCR ─────────────────────────────────────────────────────────────────────

/// DCR.FSIZE: flash holds 2^(FSIZE + 1) bytes
pub const DCR_FSIZE: Field = Field::new(16, 5);
/// DCR.CSHT: chip select high time minus one, in cycles
pub const DCR_CSHT: Field = Field::new(8, 3);
/// DCR.CKMODE: clock idles high (mode 3) when set
pub const DCR_CKMODE: Field = Field::bit(0);

// ── SR ──────────────────────────────────────────────────────────────────────

/// SR.FLEVEL: bytes currently held in the FIFO
pub const SR_FLEVEL: Field = Field::new(8, 6);

// ── CCR ─────────────────────────────────────────────────────────────────────

/// CCR.DDRM: double data rate mode
pub const CCR_DDRM: Field = Field::bit(31);
/// CCR.DHHC: DDR hold (delay data output by a quarter cycle)
pub const CCR_DHHC: Field = Field::bit(30);
/// CCR.SIOO: send instruction only once
pub const CCR_SIOO: Field = Field::bit(28);
/// CCR.FMODE: functional mode
pub const CCR_FMODE: Field = Field::new(26, 2);
/// CCR.DMODE: data line mode
pub const CCR_DMODE: Field = Field::new(24, 2);
/// CCR.DCYC: dummy cycles
pub const CCR_DCYC: Field = Field::new(18, 5);
/// CCR.ABSIZE: alternate bytes size
pub const CCR_ABSIZE: Field = Field::new(16, 2);
/// CCR.ABMODE: alternate bytes line mode
pub const CCR_ABMODE: Field = Field::new(14, 2);
/// CCR.ADSIZE: address size
pub const CCR_ADSIZE: Field = Field::new(12, 2);
/// CCR.ADMODE: address line mode
pub const CCR_ADMODE: Field = Field::new(10, 2);
/// CCR.IMODE: instruction line mode
pub const CCR_IMODE: Field = Field::new(8, 2);
/// CCR.INSTRUCTION: opcode
pub const CCR_INSTRUCTION: Field = Field::new(0, 8);

bitflags! {
    /// SR event flags (read-only; cleared through [`ClearFlags`]).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u32 {
        /// BUSY: an operation is ongoing
        const BUSY = 1 << 5;
        /// TOF: timeout
        const TIMEOUT = 1 << 4;
        /// SMF: status match
        const STATUS_MATCH = 1 << 3;
        /// FTF: FIFO threshold reached
        const FIFO_THRESHOLD = 1 << 2;
        /// TCF: transfer complete
        const TRANSFER_COMPLETE = 1 << 1;
        /// TEF: transfer error
        const TRANSFER_ERROR = 1 << 0;
    }
}

bitflags! {
    /// CR interrupt enables.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Interrupts: u32 {
        /// TOIE: timeout
        const TIMEOUT = 1 << 20;
        /// SMIE: status match
        const STATUS_MATCH = 1 << 19;
        /// FTIE: FIFO threshold
        const FIFO_THRESHOLD = 1 << 18;
        /// TCIE: transfer complete
        const TRANSFER_COMPLETE = 1 << 17;
        /// TEIE: transfer error
        const TRANSFER_ERROR = 1 << 16;
    }
}

bitflags! {
    /// FCR write-one-to-clear bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearFlags: u32 {
        /// CTOF
        const TIMEOUT = 1 << 4;
        /// CSMF
        const STATUS_MATCH = 1 << 3;
        /// CTCF
        const TRANSFER_COMPLETE = 1 << 1;
        /// CTEF
        const TRANSFER_ERROR = 1 << 0;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Status {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Status({=u32:#x})", self.bits());
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Interrupts {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Interrupts({=u32:#x})", self.bits());
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ClearFlags {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "ClearFlags({=u32:#x})", self.bits());
    }
}
