//! Command presets for the W25Q128JV serial NOR flash.
//!
//! Every preset is a `const fn` returning a [`TransferCommand`], ready for
//! [`QuadSpi::read`](super::QuadSpi::read) or
//! [`QuadSpi::write`](super::QuadSpi::write).
//!
//! # Hardware
//!
//! **Flash chip:** W25Q128JV (Winbond), 16 MB, 133 MHz max
//!
//! **Fast Read Quad I/O (0xEB):**
//! - 8-bit instruction, single line
//! - 24-bit address, quad lines
//! - 8-bit mode byte (alternate bytes), quad lines
//! - 4 dummy cycles
//! - data on quad lines
//!
//! # Sources
//!
//! - W25Q128JV datasheet (Winbond, rev. L 2021): §8.1 instruction set table
//! - STM32H743 Reference Manual RM0433: §24.3 QUADSPI functional description

use super::command::{LineMode, PhaseSize, TransferCommand};
use crate::error::XferError;

/// W25Q128JV maximum operating frequency (Hz).
pub const MAX_FREQ_HZ: u32 = 133_000_000;

/// `DCR.FSIZE` for the W25Q128JV.
///
/// Addressable bytes = 2^(`FSIZE` + 1); 16 MB = 2^24 → `FSIZE = 23`.
pub const FLASH_SIZE_FIELD: u8 = 23;

/// Program page size in bytes; a page program must not cross this boundary.
pub const PAGE_SIZE: usize = 256;

/// Smallest erasable unit in bytes.
pub const SECTOR_SIZE: u32 = 4096;

/// Dummy cycles for Fast Read Quad I/O after the mode byte.
pub const QUAD_IO_DUMMY_CYCLES: u8 = 4;

/// Mode byte sent after the address in Fast Read Quad I/O (continuous read off).
pub const QUAD_IO_MODE_BYTE: u32 = 0xFF;

/// Instruction opcodes.
pub mod opcode {
    /// Read JEDEC ID (manufacturer, memory type, capacity)
    pub const READ_JEDEC_ID: u8 = 0x9F;
    /// Read status register 1
    pub const READ_STATUS_1: u8 = 0x05;
    /// Write enable
    pub const WRITE_ENABLE: u8 = 0x06;
    /// Page program, single line
    pub const PAGE_PROGRAM: u8 = 0x02;
    /// Quad input page program
    pub const QUAD_PAGE_PROGRAM: u8 = 0x32;
    /// Fast read quad I/O
    pub const FAST_READ_QUAD_IO: u8 = 0xEB;
    /// 4 KB sector erase
    pub const SECTOR_ERASE: u8 = 0x20;
}

/// JEDEC ID returned by the W25Q128JV (Winbond, SPI, 128 Mbit).
pub const JEDEC_ID: [u8; 3] = [0xEF, 0x40, 0x18];

/// Status register 1 bit: erase or program in progress.
pub const STATUS_BUSY: u8 = 1 << 0;

/// Status register 1 bit: write enable latch.
pub const STATUS_WEL: u8 = 1 << 1;

/// Read the three JEDEC ID bytes.
pub const fn read_jedec_id() -> TransferCommand {
    TransferCommand::new()
        .instruction(LineMode::Single, opcode::READ_JEDEC_ID)
        .data(LineMode::Single)
}

/// Read status register 1 (one byte).
pub const fn read_status() -> TransferCommand {
    TransferCommand::new()
        .instruction(LineMode::Single, opcode::READ_STATUS_1)
        .data(LineMode::Single)
}

/// Set the write enable latch; required before program and erase.
pub const fn write_enable() -> TransferCommand {
    TransferCommand::new().instruction(LineMode::Single, opcode::WRITE_ENABLE)
}

/// Program up to [`PAGE_SIZE`] bytes at `address`, single line.
pub const fn page_program(address: u32) -> TransferCommand {
    TransferCommand::new()
        .instruction(LineMode::Single, opcode::PAGE_PROGRAM)
        .address(LineMode::Single, PhaseSize::Bits24, address)
        .data(LineMode::Single)
}

/// Program up to [`PAGE_SIZE`] bytes at `address`, data on four lines.
pub const fn quad_page_program(address: u32) -> TransferCommand {
    TransferCommand::new()
        .instruction(LineMode::Single, opcode::QUAD_PAGE_PROGRAM)
        .address(LineMode::Single, PhaseSize::Bits24, address)
        .data(LineMode::Quad)
}

/// Fast Read Quad I/O from `address`.
pub const fn fast_read_quad_io(address: u32) -> TransferCommand {
    TransferCommand::new()
        .instruction(LineMode::Single, opcode::FAST_READ_QUAD_IO)
        .address(LineMode::Quad, PhaseSize::Bits24, address)
        .alternate_bytes(LineMode::Quad, PhaseSize::Bits8, QUAD_IO_MODE_BYTE)
        .dummy_cycles(QUAD_IO_DUMMY_CYCLES)
        .data(LineMode::Quad)
}

/// Erase the 4 KB sector containing `address`.
pub const fn sector_erase(address: u32) -> TransferCommand {
    TransferCommand::new()
        .instruction(LineMode::Single, opcode::SECTOR_ERASE)
        .address(LineMode::Single, PhaseSize::Bits24, address)
}

/// Check that `prescaler` keeps the QUADSPI clock within W25Q128JV limits.
///
/// QUADSPI clock = `ahb_hz / (prescaler + 1)`. Returns the resulting clock.
///
/// ```
/// use xfer::quadspi::config::validate_prescaler;
/// assert_eq!(validate_prescaler(240_000_000, 1), Ok(120_000_000));
/// assert!(validate_prescaler(240_000_000, 0).is_err());
/// ```
pub fn validate_prescaler(ahb_hz: u32, prescaler: u8) -> Result<u32, XferError> {
    let qspi_hz = ahb_hz
        .checked_div(u32::from(prescaler).saturating_add(1))
        .unwrap_or(ahb_hz);
    if qspi_hz > MAX_FREQ_HZ {
        return Err(XferError::ClockTooFast(qspi_hz));
    }
    Ok(qspi_hz)
}
