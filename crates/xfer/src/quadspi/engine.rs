//! Polled QUADSPI driver
//!
//! Indirect-mode transfers through the byte-wide data register, busy-polling
//! SR between bytes. The caller is blocked until the whole transfer is done
//! (or the [`WaitBudget`] runs out).

use super::command::{encode, FunctionMode, LineMode, PhaseSize, TransferCommand};
use super::regs::{
    ClearFlags, Interrupts, Status, ABR, AR, CCR, CCR_ABMODE, CCR_ABSIZE, CCR_ADMODE, CCR_ADSIZE,
    CCR_DCYC, CCR_DDRM, CCR_DHHC, CCR_DMODE, CCR_FMODE, CCR_IMODE, CCR_INSTRUCTION, CCR_SIOO, CR,
    CR_ABORT, CR_EN, CR_FLASH_SELECT, CR_FTHRES, CR_PRESCALER, DCR, DCR_CKMODE, DCR_CSHT,
    DCR_FSIZE, DLR, DR, FCR, SR, SR_FLEVEL,
};
use crate::error::XferError;
use crate::regs::{Field, RegisterFile};
use crate::wait::WaitBudget;

/// Data phase buffer for [`QuadSpi::execute`].
#[derive(Debug)]
pub enum Data<'a> {
    /// No data phase
    None,
    /// Bytes sent to the device (indirect write)
    Write(&'a [u8]),
    /// Bytes received from the device (indirect read)
    Read(&'a mut [u8]),
}

impl Data<'_> {
    /// Buffer length in bytes.
    pub fn len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Write(buf) => buf.len(),
            Self::Read(buf) => buf.len(),
        }
    }

    /// `true` when there are no bytes to move.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn function_mode(&self) -> FunctionMode {
        match self {
            Self::Read(_) => FunctionMode::IndirectRead,
            Self::None | Self::Write(_) => FunctionMode::IndirectWrite,
        }
    }
}

/// Flash selection (CR.DFM/CR.FSEL).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashSelect {
    /// Flash 1 only
    Flash1,
    /// Flash 2 only
    Flash2,
    /// Both flashes in dual-flash mode
    Dual,
}

impl FlashSelect {
    const fn bits(self) -> u32 {
        match self {
            Self::Flash1 => 2,
            Self::Flash2 => 3,
            Self::Dual => 1,
        }
    }
}

/// Clock level while chip select is high (DCR.CKMODE).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockMode {
    /// CLK stays low while nCS is high
    Mode0,
    /// CLK stays high while nCS is high
    Mode3,
}

/// QUADSPI controller bound to a register file.
pub struct QuadSpi<R> {
    regs: R,
    base: usize,
    budget: WaitBudget,
}

impl<R: RegisterFile> QuadSpi<R> {
    /// Bind the controller at `base` (see [`super::QUADSPI_BASE`]).
    ///
    /// Waits default to [`WaitBudget::Infinite`].
    pub fn new(regs: R, base: usize) -> Self {
        Self {
            regs,
            base,
            budget: WaitBudget::Infinite,
        }
    }

    /// Replace the wait budget used by every hardware wait.
    #[must_use]
    pub fn with_wait_budget(mut self, budget: WaitBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Current wait budget.
    pub fn wait_budget(&self) -> WaitBudget {
        self.budget
    }

    /// Peripheral base address.
    pub fn base(&self) -> usize {
        self.base
    }

    /// Borrow the register file.
    pub fn regs(&self) -> &R {
        &self.regs
    }

    /// Mutably borrow the register file.
    pub fn regs_mut(&mut self) -> &mut R {
        &mut self.regs
    }

    /// Give the register file back.
    pub fn release(self) -> R {
        self.regs
    }

    fn addr(&self, offset: usize) -> usize {
        self.base.wrapping_add(offset)
    }

    fn write_reg(&mut self, offset: usize, value: u32) {
        let addr = self.addr(offset);
        self.regs.write32(addr, value);
    }

    fn read_reg(&mut self, offset: usize) -> u32 {
        let addr = self.addr(offset);
        self.regs.read32(addr)
    }

    fn write_field(&mut self, offset: usize, field: Field, value: u32) {
        let addr = self.addr(offset);
        self.regs.write_field(addr, field, value);
    }

    fn wait_for(&mut self, flags: Status) -> Result<(), XferError> {
        let sr = self.addr(SR);
        let budget = self.budget;
        let regs = &mut self.regs;
        budget.poll(|| Status::from_bits_truncate(regs.read32(sr)).intersects(flags))
    }

    // ── Transfers ───────────────────────────────────────────────────────────

    /// Run one indirect-mode transaction to completion.
    ///
    /// Register order is fixed: wait for !BUSY, DLR (only with a data
    /// phase), CCR, AR (only with an address phase), ABR (only with an
    /// alternate-bytes phase), then one DR access per byte, each preceded by
    /// a wait for FTF or TCF. Finally waits for TCF and clears it.
    ///
    /// Argument errors are reported before any register is touched. A
    /// [`XferError::Timeout`] can leave the transfer half done; call
    /// [`QuadSpi::abort`] before retrying.
    ///
    /// Returns the number of bytes moved.
    pub fn execute(&mut self, cmd: &TransferCommand, data: Data<'_>) -> Result<usize, XferError> {
        let len = data.len();
        if cmd.has_data() && len == 0 {
            return Err(XferError::MissingBuffer);
        }
        if !cmd.has_data() && len > 0 {
            return Err(XferError::UnexpectedBuffer);
        }
        let dlr = match len.checked_sub(1) {
            Some(last) => Some(u32::try_from(last).map_err(|_| XferError::TooLong(len))?),
            None => None,
        };

        trace!("quadspi: opcode {} len {}", cmd.instruction.opcode, len);

        self.wait_while_busy()?;

        if let Some(dlr) = dlr {
            self.write_reg(DLR, dlr);
        }

        let ccr = encode(cmd) | CCR_FMODE.pack(data.function_mode().bits());
        self.write_reg(CCR, ccr);

        if cmd.has_address() {
            self.write_reg(AR, cmd.address.value);
        }
        if cmd.has_alternate_bytes() {
            self.write_reg(ABR, cmd.alternate_bytes.value);
        }

        let ready = Status::FIFO_THRESHOLD | Status::TRANSFER_COMPLETE;
        let dr = self.addr(DR);
        match data {
            Data::None => {}
            Data::Write(buf) => {
                for &byte in buf {
                    self.wait_for(ready)?;
                    self.regs.write8(dr, byte);
                }
            }
            Data::Read(buf) => {
                for byte in buf.iter_mut() {
                    self.wait_for(ready)?;
                    *byte = self.regs.read8(dr);
                }
            }
        }

        self.wait_for(Status::TRANSFER_COMPLETE)?;
        self.clear_flags(ClearFlags::TRANSFER_COMPLETE);

        debug!("quadspi: opcode {} done, {} bytes", cmd.instruction.opcode, len);
        Ok(len)
    }

    /// Indirect write of `buf`. An empty `buf` sends a command with no data
    /// phase (write enable, erase, ...).
    pub fn write(&mut self, cmd: &TransferCommand, buf: &[u8]) -> Result<usize, XferError> {
        let data = if buf.is_empty() {
            Data::None
        } else {
            Data::Write(buf)
        };
        self.execute(cmd, data)
    }

    /// Indirect read into `buf`.
    pub fn read(&mut self, cmd: &TransferCommand, buf: &mut [u8]) -> Result<usize, XferError> {
        let data = if buf.is_empty() {
            Data::None
        } else {
            Data::Read(buf)
        };
        self.execute(cmd, data)
    }

    /// Choose the smallest prescaler whose output does not exceed `bus_hz`,
    /// program it and return the frequency actually achieved.
    ///
    /// A request below `ahb_hz / 256` (or zero) clamps to the largest
    /// divider.
    pub fn set_bus_frequency(&mut self, ahb_hz: u32, bus_hz: u32) -> u32 {
        let divider = match ahb_hz.checked_div(bus_hz) {
            Some(_) => ahb_hz.div_ceil(bus_hz).clamp(1, 256),
            None => 256,
        };
        let prescaler = u8::try_from(divider.saturating_sub(1)).unwrap_or(u8::MAX);
        self.set_prescaler(prescaler);
        let achieved = ahb_hz
            .checked_div(u32::from(prescaler).saturating_add(1))
            .unwrap_or(ahb_hz);
        debug!(
            "quadspi: prescaler {} gives {} Hz (asked {} Hz)",
            prescaler, achieved, bus_hz
        );
        achieved
    }

    // ── CR ──────────────────────────────────────────────────────────────────

    /// Set CR.EN.
    pub fn enable(&mut self) {
        self.write_field(CR, CR_EN, 1);
    }

    /// Clear CR.EN.
    pub fn disable(&mut self) {
        self.write_field(CR, CR_EN, 0);
    }

    /// Request an abort of the ongoing command (hardware clears ABORT).
    pub fn abort(&mut self) {
        warn!("quadspi: abort requested");
        self.write_field(CR, CR_ABORT, 1);
    }

    /// Program CR.PRESCALER; the kernel clock is divided by `prescaler + 1`.
    ///
    /// Only valid while the interface is not busy.
    pub fn set_prescaler(&mut self, prescaler: u8) {
        self.write_field(CR, CR_PRESCALER, u32::from(prescaler));
    }

    /// Select flash 1, flash 2 or dual-flash mode.
    pub fn select_flash(&mut self, flash: FlashSelect) {
        self.write_field(CR, CR_FLASH_SELECT, flash.bits());
    }

    /// Program CR.FTHRES (threshold minus one, 0–31).
    pub fn set_fifo_threshold(&mut self, threshold: u8) {
        self.write_field(CR, CR_FTHRES, u32::from(threshold));
    }

    /// Set interrupt enable bits.
    pub fn enable_interrupts(&mut self, irq: Interrupts) {
        let addr = self.addr(CR);
        self.regs.set_bits32(addr, irq.bits());
    }

    /// Clear interrupt enable bits.
    pub fn disable_interrupts(&mut self, irq: Interrupts) {
        let addr = self.addr(CR);
        self.regs.clear_bits32(addr, irq.bits());
    }

    // ── DCR ─────────────────────────────────────────────────────────────────

    /// Clock idle level between commands.
    pub fn set_clock_mode(&mut self, mode: ClockMode) {
        let bit = match mode {
            ClockMode::Mode0 => 0,
            ClockMode::Mode3 => 1,
        };
        self.write_field(DCR, DCR_CKMODE, bit);
    }

    /// Program DCR.CSHT; nCS stays high for `cycles + 1` clocks.
    pub fn set_cs_high_time(&mut self, cycles: u8) {
        self.write_field(DCR, DCR_CSHT, u32::from(cycles));
    }

    /// Program DCR.FSIZE; the flash holds 2^(`fsize` + 1) bytes.
    pub fn set_flash_size(&mut self, fsize: u8) {
        self.write_field(DCR, DCR_FSIZE, u32::from(fsize));
    }

    // ── SR / FCR ────────────────────────────────────────────────────────────

    /// Snapshot of SR event flags (BUSY included).
    pub fn status(&mut self) -> Status {
        Status::from_bits_truncate(self.read_reg(SR))
    }

    /// Whether every bit of `flag` is set in SR.
    pub fn flag(&mut self, flag: Status) -> bool {
        self.status().contains(flag)
    }

    /// Whether an operation is in progress.
    pub fn is_busy(&mut self) -> bool {
        self.flag(Status::BUSY)
    }

    /// Spin until SR.BUSY drops.
    pub fn wait_while_busy(&mut self) -> Result<(), XferError> {
        let sr = self.addr(SR);
        let budget = self.budget;
        let regs = &mut self.regs;
        budget.poll(|| !Status::from_bits_truncate(regs.read32(sr)).contains(Status::BUSY))
    }

    /// Bytes currently held in the FIFO (0–32).
    #[allow(clippy::cast_possible_truncation)] // Safety: FLEVEL is 6 bits
    pub fn fifo_level(&mut self) -> u8 {
        SR_FLEVEL.unpack(self.read_reg(SR)) as u8
    }

    /// Clear event flags through FCR.
    pub fn clear_flags(&mut self, flags: ClearFlags) {
        self.write_reg(FCR, flags.bits());
    }

    // ── DLR / CCR / AR / ABR ────────────────────────────────────────────────

    /// Program DLR directly (number of bytes minus one; `u32::MAX` means
    /// "until the end of flash").
    pub fn set_data_length(&mut self, dlr: u32) {
        self.write_reg(DLR, dlr);
    }

    /// Set CCR.FMODE.
    pub fn set_function_mode(&mut self, mode: FunctionMode) {
        self.write_field(CCR, CCR_FMODE, mode.bits());
    }

    /// Set CCR.DMODE.
    pub fn set_data_mode(&mut self, mode: LineMode) {
        self.write_field(CCR, CCR_DMODE, mode.bits());
    }

    /// Set CCR.DCYC (0–31).
    pub fn set_dummy_cycles(&mut self, cycles: u8) {
        self.write_field(CCR, CCR_DCYC, u32::from(cycles));
    }

    /// Set CCR.ABSIZE.
    pub fn set_alternate_bytes_size(&mut self, size: PhaseSize) {
        self.write_field(CCR, CCR_ABSIZE, size.bits());
    }

    /// Set CCR.ABMODE.
    pub fn set_alternate_bytes_mode(&mut self, mode: LineMode) {
        self.write_field(CCR, CCR_ABMODE, mode.bits());
    }

    /// Set CCR.ADSIZE.
    pub fn set_address_size(&mut self, size: PhaseSize) {
        self.write_field(CCR, CCR_ADSIZE, size.bits());
    }

    /// Set CCR.ADMODE.
    pub fn set_address_mode(&mut self, mode: LineMode) {
        self.write_field(CCR, CCR_ADMODE, mode.bits());
    }

    /// Set CCR.IMODE.
    pub fn set_instruction_mode(&mut self, mode: LineMode) {
        self.write_field(CCR, CCR_IMODE, mode.bits());
    }

    /// Set or clear CCR.DDRM.
    pub fn set_double_data_rate(&mut self, on: bool) {
        self.write_field(CCR, CCR_DDRM, u32::from(on));
    }

    /// Set or clear CCR.DHHC.
    pub fn set_ddr_hold(&mut self, on: bool) {
        self.write_field(CCR, CCR_DHHC, u32::from(on));
    }

    /// Set or clear CCR.SIOO.
    pub fn set_instruction_once(&mut self, on: bool) {
        self.write_field(CCR, CCR_SIOO, u32::from(on));
    }

    /// Write CCR.INSTRUCTION. In indirect mode without address or data
    /// phase this starts the command.
    pub fn send_instruction(&mut self, opcode: u8) {
        self.write_field(CCR, CCR_INSTRUCTION, u32::from(opcode));
    }

    /// Write AR.
    pub fn set_address(&mut self, address: u32) {
        self.write_reg(AR, address);
    }

    /// Write ABR.
    pub fn set_alternate_bytes(&mut self, value: u32) {
        self.write_reg(ABR, value);
    }

    // ── DR ──────────────────────────────────────────────────────────────────

    /// Push one byte into the FIFO.
    pub fn write_byte(&mut self, byte: u8) {
        let dr = self.addr(DR);
        self.regs.write8(dr, byte);
    }

    /// Push two bytes into the FIFO.
    pub fn write_halfword(&mut self, half: u16) {
        let dr = self.addr(DR);
        self.regs.write16(dr, half);
    }

    /// Push four bytes into the FIFO.
    pub fn write_word(&mut self, word: u32) {
        self.write_reg(DR, word);
    }

    /// Pop one byte from the FIFO.
    pub fn read_byte(&mut self) -> u8 {
        let dr = self.addr(DR);
        self.regs.read8(dr)
    }

    /// Pop two bytes from the FIFO.
    pub fn read_halfword(&mut self) -> u16 {
        let dr = self.addr(DR);
        self.regs.read16(dr)
    }

    /// Pop four bytes from the FIFO.
    pub fn read_word(&mut self) -> u32 {
        self.read_reg(DR)
    }
}
